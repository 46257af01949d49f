//! One invocation, start to finish.
//!
//! Two trigger modes: `probe` checks provider connectivity by listing
//! models and touches nothing else; `run` performs the search, filters to
//! the lookback window, and delivers the digest. A search failure is a
//! *handled* outcome — it is reported to the webhook and the invocation
//! still returns a result record — while a failing webhook call is not
//! guarded and surfaces as an invocation error.

use chrono::Utc;
use lookout_common::{LookoutError, Result};
use lookout_config::Config;
use lookout_notify::{DiscordWebhook, NotifyError, JSON_BLOCK_LIMIT};
use lookout_search::grok::extract::{normalize, render_lines, window, within_window};
use lookout_search::grok::types::ChatResponse;
use lookout_search::grok::GrokApi;
use serde::Serialize;
use std::time::Duration;

/// Posted instead of an empty digest so the channel still sees a heartbeat.
pub const NO_UPDATES_PLACEHOLDER: &str = "（無更新）";

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    Run,
    Probe,
}

/// The invocation's result record, printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    fn success() -> Self {
        Self {
            ok: true,
            models_count: None,
            error: None,
        }
    }

    fn probe(models_count: usize) -> Self {
        Self {
            ok: true,
            models_count: Some(models_count),
            error: None,
        }
    }

    fn handled_failure(error: String) -> Self {
        Self {
            ok: false,
            models_count: None,
            error: Some(error),
        }
    }
}

pub struct Runner {
    grok: GrokApi,
    webhook: DiscordWebhook,
    handles: Vec<String>,
    days: i64,
    max_results: u32,
    debug: bool,
}

impl Runner {
    pub fn new(config: &Config) -> Result<Self> {
        let grok = GrokApi::new(
            config.grok_api_key.clone(),
            Duration::from_secs(config.http_timeout),
        );
        Self::with_grok(config, grok)
    }

    /// Construct against a different search endpoint. Tests point this at a
    /// local mock server.
    pub fn with_search_base(config: &Config, base: &str) -> Result<Self> {
        let grok = GrokApi::with_base(
            base,
            config.grok_api_key.clone(),
            Duration::from_secs(config.http_timeout),
        )
        .map_err(|e| LookoutError::Search(e.to_string()))?;
        Self::with_grok(config, grok)
    }

    fn with_grok(config: &Config, grok: GrokApi) -> Result<Self> {
        let webhook = DiscordWebhook::new(&config.discord_webhook_url).map_err(as_notify)?;
        Ok(Self {
            grok,
            webhook,
            handles: config.x_handles.clone(),
            days: config.days,
            max_results: config.max_results,
            debug: config.debug,
        })
    }

    pub async fn execute(&self, mode: Mode) -> Result<RunReport> {
        match mode {
            Mode::Probe => self.probe().await,
            Mode::Run => self.run().await,
        }
    }

    /// Health check: verify the key and network path by listing models.
    /// No search, no notification.
    pub async fn probe(&self) -> Result<RunReport> {
        let models = self
            .grok
            .list_models()
            .await
            .map_err(|e| LookoutError::Search(e.to_string()))?;
        tracing::info!(models_count = models.data.len(), "probe succeeded");
        Ok(RunReport::probe(models.data.len()))
    }

    pub async fn run(&self) -> Result<RunReport> {
        if self.handles.is_empty() {
            return Err(LookoutError::Config("X_HANDLES is empty".into()));
        }

        match self
            .grok
            .search_recent(&self.handles, self.days, self.max_results)
            .await
        {
            Ok(envelope) => {
                // Debug echo always precedes the summary message.
                if self.debug {
                    self.send_debug(&envelope).await?;
                }

                let (start, end) = window(Utc::now(), self.days);
                let kept = within_window(normalize(&envelope), start, end);
                let text = render_lines(&kept);
                let message = if text.is_empty() {
                    NO_UPDATES_PLACEHOLDER
                } else {
                    text.as_str()
                };
                self.webhook.notify(message).await.map_err(as_notify)?;
                tracing::info!(items = kept.len(), "digest delivered");
                Ok(RunReport::success())
            }
            Err(err) => {
                tracing::warn!(error = %err, "search failed; notifying operator");
                self.webhook
                    .notify(&format!("⚠️ lookout search failed: {err}"))
                    .await
                    .map_err(as_notify)?;
                Ok(RunReport::handled_failure(err.to_string()))
            }
        }
    }

    async fn send_debug(&self, envelope: &ChatResponse) -> Result<()> {
        let raw = serde_json::to_value(envelope).unwrap_or(serde_json::Value::Null);
        let pretty = serde_json::to_string_pretty(&raw).unwrap_or_default();
        if pretty.chars().count() <= JSON_BLOCK_LIMIT {
            self.webhook
                .notify_json("Grok raw response", &raw)
                .await
                .map_err(as_notify)
        } else {
            self.webhook
                .notify_chunked("Grok raw response", &pretty)
                .await
                .map_err(as_notify)
        }
    }
}

fn as_notify(err: NotifyError) -> LookoutError {
    LookoutError::Notify(err.to_string())
}
