//! Wrapper around the xAI chat-completions API with Lookout defaults.
//!
//! Handles auth, request shaping, and the two-tier degradation policy before
//! delegating to the shared HTTP client. The policy is deliberately
//! `attempt(full) orElse attempt(reduced)` rather than a generic retry loop:
//! the second attempt shrinks the result cap, token budget, and timeout so a
//! provider under load still has a chance to answer something.

use crate::grok::extract::window;
use crate::grok::types::{
    ChatMessage, ChatRequest, ChatResponse, ModelList, ResponseFormat, SearchParameters,
    SearchSource,
};
use chrono::{DateTime, Utc};
use lookout_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::time::Duration;
use thiserror::Error;

pub const XAI_API_BASE: &str = "https://api.x.ai/v1/";
pub const CHAT_MODEL: &str = "grok-4-latest";

const PRIMARY_MAX_TOKENS: u32 = 800;
const FALLBACK_MAX_TOKENS: u32 = 400;
const PRIMARY_TIMEOUT_CEILING: Duration = Duration::from_secs(170);
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT_CEILING: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Both attempt tiers failed; carries both causes for the operator.
    #[error("search failed twice; primary: {primary}; fallback: {fallback}")]
    Exhausted { primary: String, fallback: String },
}

/// One tier of the degradation policy.
#[derive(Debug, Clone, Copy)]
struct AttemptParams {
    max_per_account: u32,
    max_tokens: u32,
    timeout: Duration,
}

impl AttemptParams {
    fn primary(max_per_account: u32, configured_timeout: Duration) -> Self {
        Self {
            max_per_account,
            max_tokens: PRIMARY_MAX_TOKENS,
            timeout: configured_timeout.min(PRIMARY_TIMEOUT_CEILING),
        }
    }

    fn reduced() -> Self {
        Self {
            max_per_account: 1,
            max_tokens: FALLBACK_MAX_TOKENS,
            timeout: FALLBACK_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct GrokApi {
    http: HttpClient,
    api_key: String,
}

impl GrokApi {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let http = HttpClient::new(XAI_API_BASE)
            .expect("xai base url")
            .with_timeout(timeout);
        Self { http, api_key }
    }

    /// Point the client at a different base URL. Tests use this to talk to a
    /// local mock server.
    pub fn with_base(base: &str, api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        let http = HttpClient::new(base)?.with_timeout(timeout);
        Ok(Self { http, api_key })
    }

    /// Search recent posts from the given handles. Returns the raw envelope
    /// unmodified on success of either tier.
    pub async fn search_recent(
        &self,
        handles: &[String],
        window_days: i64,
        max_per_account: u32,
    ) -> Result<ChatResponse, SearchError> {
        let primary = AttemptParams::primary(max_per_account, self.http.default_timeout);
        let first = match self.attempt(handles, window_days, primary).await {
            Ok(envelope) => return Ok(envelope),
            Err(err) => err,
        };

        tracing::warn!(error = %first, "grok.search.primary_failed");

        let reduced = AttemptParams::reduced();
        match self.attempt(handles, window_days, reduced).await {
            Ok(envelope) => {
                tracing::info!(
                    max_per_account = reduced.max_per_account,
                    max_tokens = reduced.max_tokens,
                    "grok.search.fallback_succeeded"
                );
                Ok(envelope)
            }
            Err(second) => Err(SearchError::Exhausted {
                primary: first.to_string(),
                fallback: second.to_string(),
            }),
        }
    }

    async fn attempt(
        &self,
        handles: &[String],
        window_days: i64,
        params: AttemptParams,
    ) -> Result<ChatResponse, HttpError> {
        let request = build_search_request(
            handles,
            window_days,
            params.max_per_account,
            params.max_tokens,
            Utc::now(),
        );
        self.http
            .post_json(
                "chat/completions",
                &request,
                RequestOpts {
                    auth: Auth::Bearer(&self.api_key),
                    timeout: Some(params.timeout),
                    ..Default::default()
                },
            )
            .await
    }

    /// Fetch the provider's model list. Probe mode uses this to verify the
    /// key and network path without spending a search.
    pub async fn list_models(&self) -> Result<ModelList, SearchError> {
        let timeout = self.http.default_timeout.min(PROBE_TIMEOUT_CEILING);
        let models = self
            .http
            .get_json(
                "models",
                RequestOpts {
                    auth: Auth::Bearer(&self.api_key),
                    timeout: Some(timeout),
                    ..Default::default()
                },
            )
            .await?;
        Ok(models)
    }
}

/// Build the chat-completion request for one attempt. Pure so the shape is
/// testable without a clock or a server.
pub fn build_search_request(
    handles: &[String],
    window_days: i64,
    max_per_account: u32,
    max_tokens: u32,
    now: DateTime<Utc>,
) -> ChatRequest {
    let (start, end) = window(now, window_days);

    let system = format!(
        "You are a retrieval assistant. Reply with JSON only: an object whose \
         \"items\" array holds posts published within [{start}, {end}). Each item is \
         {{account, title, url, posted_at_utc}} with posted_at_utc in UTC ISO 8601, \
         e.g. 2025-11-03T04:15:00Z. No extra text.",
        start = start.format("%Y-%m-%dT%H:%M:%SZ"),
        end = end.format("%Y-%m-%dT%H:%M:%SZ"),
    );
    let user = format!(
        "accounts={}; start_utc={}; end_utc={}; per_account_max={}",
        handles.join(","),
        start.format("%Y-%m-%dT%H:%M:%SZ"),
        end.format("%Y-%m-%dT%H:%M:%SZ"),
        max_per_account,
    );

    ChatRequest {
        model: CHAT_MODEL.to_string(),
        response_format: ResponseFormat::json_object(),
        messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        max_tokens,
        search_parameters: SearchParameters {
            mode: "on".to_string(),
            sources: vec![SearchSource::x_handles(handles)],
            from_date: start.format("%Y-%m-%d").to_string(),
            to_date: end.format("%Y-%m-%d").to_string(),
            max_results: max_per_account,
        },
    }
}
