//! Discord webhook notifier.
//!
//! Three delivery shapes: a plain text message, a fenced-JSON debug message
//! (truncated to fit one message), and chunked delivery for text that would
//! blow past Discord's 2000-character message limit. The webhook URL embeds
//! its own secret, so requests carry no Authorization header; failures are
//! not retried here.

use lookout_http::{HttpClient, HttpError, RequestOpts, StatusCode};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Discord rejects message content above this many characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
/// Cap for the pretty-printed body inside a fenced debug block, leaving
/// headroom for the title and the fence itself.
pub const JSON_BLOCK_LIMIT: usize = 1800;
/// Per-chunk cap for [`DiscordWebhook::notify_chunked`], leaving headroom
/// for the `prefix (part i/n)` label line.
pub const CHUNK_LIMIT: usize = 1900;

const POST_TIMEOUT: Duration = Duration::from_secs(20);
const TRUNCATION_MARKER: &str = "… (truncated)";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook returned {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("webhook transport failure: {0}")]
    Transport(String),
}

impl From<HttpError> for NotifyError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api {
                status, message, ..
            } => Self::Rejected { status, message },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct DiscordWebhook {
    http: HttpClient,
}

impl DiscordWebhook {
    pub fn new(webhook_url: &str) -> Result<Self, NotifyError> {
        let http = HttpClient::new(webhook_url)
            .map_err(NotifyError::from)?
            .with_timeout(POST_TIMEOUT);
        Ok(Self { http })
    }

    /// Post one plain message.
    pub async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.post_content(text).await
    }

    /// Pretty-print `data`, truncate it to [`JSON_BLOCK_LIMIT`] characters,
    /// and post it under `title` inside a fenced code block.
    pub async fn notify_json(
        &self,
        title: &str,
        data: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        let content = fenced_json(title, data, JSON_BLOCK_LIMIT);
        self.post_content(&content).await
    }

    /// Split `text` into sequential chunks of at most [`CHUNK_LIMIT`]
    /// characters and post each as its own message. Multi-chunk delivery
    /// labels each message `prefix (part i/n)`; a single chunk keeps the
    /// bare `prefix`. Order is preserved.
    pub async fn notify_chunked(&self, prefix: &str, text: &str) -> Result<(), NotifyError> {
        let chunks = chunk_text(text, CHUNK_LIMIT);
        let total = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate() {
            let label = if total > 1 {
                format!("{} (part {}/{})", prefix, idx + 1, total)
            } else {
                prefix.to_string()
            };
            self.post_content(&format!("{label}\n{chunk}")).await?;
        }
        Ok(())
    }

    async fn post_content(&self, content: &str) -> Result<(), NotifyError> {
        tracing::debug!(chars = content.chars().count(), "discord.notify");
        // Discord answers 204 with an empty body; the payload is discarded.
        self.http
            .post("", &json!({ "content": content }), RequestOpts::default())
            .await?;
        Ok(())
    }
}

/// Split into chunks of at most `max_chars` characters, char-boundary safe.
/// The chunk bodies concatenate back to the input.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    chunks.push(current);
    chunks
}

fn fenced_json(title: &str, data: &serde_json::Value, max_chars: usize) -> String {
    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    let body = truncate_chars(&pretty, max_chars);
    format!("{title}\n```json\n{body}\n```")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
