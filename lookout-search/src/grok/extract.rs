//! Second-stage decode of the model's embedded JSON payload, plus the
//! window filter and line rendering.
//!
//! The outer envelope is already typed by the HTTP layer; what arrives here
//! is `choices[0].message.content`, a JSON document *inside a string*. The
//! model is told to emit `{items: [{account, title, url, posted_at_utc}]}`
//! but real responses drift, so the decode tolerates the `results` field
//! name, the pre-localized `start_date_jst` timestamp, and assorted missing
//! fields. [`normalize`] never fails: anything undecodable degrades to an
//! empty list and the caller renders a placeholder instead.

use crate::grok::types::ChatResponse;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

const JST_OFFSET_SECS: i32 = 9 * 3600;
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("valid JST offset")
}

/// The eligibility window as precise instants: `[now - days*24h, now)`.
pub fn window(now: DateTime<Utc>, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::days(days), now)
}

/// A display timestamp: the raw string the model sent, plus the UTC instant
/// derived from it when one of the two accepted forms parses.
#[derive(Debug, Clone, PartialEq)]
pub struct PostStamp {
    raw: String,
    instant: Option<DateTime<Utc>>,
}

impl PostStamp {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            raw: raw.to_string(),
            instant: parse_instant(raw),
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.instant
    }

    /// JST rendering of the instant when one exists; the raw string
    /// otherwise (conversion failure is non-fatal).
    pub fn display(&self) -> String {
        match self.instant {
            Some(t) => t.with_timezone(&jst()).format(DISPLAY_FORMAT).to_string(),
            None => self.raw.clone(),
        }
    }
}

fn looks_like_utc_instant(s: &str) -> bool {
    s.contains('T') && (s.ends_with('Z') || s.contains("+00:00"))
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if looks_like_utc_instant(s) {
        return DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc));
    }
    // Pre-localized JST form: recover the instant so the window filter
    // treats both accepted schemas identically.
    NaiveDateTime::parse_from_str(s, DISPLAY_FORMAT)
        .ok()
        .and_then(|naive| jst().from_local_datetime(&naive).single())
        .map(|t| t.with_timezone(&Utc))
}

/// One normalized, displayable record.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub account: String,
    pub title: String,
    pub url: String,
    pub posted_at: Option<PostStamp>,
}

impl LineItem {
    /// `account、title、timestamp、url` with the full-width separator.
    pub fn render(&self) -> String {
        let stamp = self
            .posted_at
            .as_ref()
            .map(PostStamp::display)
            .unwrap_or_default();
        format!("{}、{}、{}、{}", self.account, self.title, stamp, self.url)
    }
}

/// Inner-decode failures. Distinct from the envelope decode, which surfaces
/// as `HttpError::Decode` out of the search call.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("response carries no message content")]
    MissingContent,
    #[error("message content is not valid JSON: {0}")]
    Content(String),
}

/// Accepted item schemas, merged: `start_date_jst` wins over
/// `posted_at_utc` for display when both are present.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    start_date_jst: Option<String>,
    #[serde(default)]
    posted_at_utc: Option<String>,
}

/// Normalize an envelope into line items. Never fails: decode problems are
/// logged and degrade to an empty list.
pub fn normalize(envelope: &ChatResponse) -> Vec<LineItem> {
    match line_items(envelope) {
        Ok(items) => items,
        Err(ExtractError::MissingContent) => {
            tracing::debug!("grok.extract.no_content");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "grok.extract.content_decode_failed");
            Vec::new()
        }
    }
}

/// The fallible inner decode, exposed so callers that care about the
/// distinction between "empty" and "undecodable" can see it.
pub fn line_items(envelope: &ChatResponse) -> Result<Vec<LineItem>, ExtractError> {
    let content = envelope
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.as_deref())
        .ok_or(ExtractError::MissingContent)?;

    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ExtractError::Content(e.to_string()))?;

    let Some(list) = value
        .get("items")
        .or_else(|| value.get("results"))
        .and_then(serde_json::Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(list.len());
    for raw in list {
        let Ok(item) = serde_json::from_value::<RawItem>(raw.clone()) else {
            continue;
        };
        let (Some(account), Some(title), Some(url)) =
            (clean(item.account), clean(item.title), clean(item.url))
        else {
            continue;
        };
        let stamp = [item.start_date_jst, item.posted_at_utc]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());
        out.push(LineItem {
            account,
            title,
            url,
            posted_at: stamp.as_deref().map(PostStamp::parse),
        });
    }
    Ok(out)
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// The canonical window filter: keeps items whose derived instant satisfies
/// `start <= t < end`, drops everything without a parseable timestamp.
pub fn within_window(
    items: Vec<LineItem>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<LineItem> {
    items
        .into_iter()
        .filter(|item| {
            item.posted_at
                .as_ref()
                .and_then(|p| p.instant())
                .map(|t| start <= t && t < end)
                .unwrap_or(false)
        })
        .collect()
}

/// One line per item, newline-joined, insertion order preserved.
pub fn render_lines(items: &[LineItem]) -> String {
    items
        .iter()
        .map(LineItem::render)
        .collect::<Vec<_>>()
        .join("\n")
}
