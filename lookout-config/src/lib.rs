//! Loader for the process-environment configuration.
//!
//! Every setting comes from environment variables; there is no config file.
//! The loader materialises one immutable [`Config`] at startup which is then
//! passed by reference into each component, so nothing reads the environment
//! after process start.
//!
//! | variable              | required | default |
//! |-----------------------|----------|---------|
//! | `GROK_API_KEY`        | yes      | —       |
//! | `DISCORD_WEBHOOK_URL` | yes      | —       |
//! | `X_HANDLES`           | no       | empty   |
//! | `DAYS`                | no       | 1       |
//! | `MAX_RESULTS`         | no       | 2       |
//! | `HTTP_TIMEOUT`        | no       | 110     |
//! | `DEBUG`               | no       | false   |

use config::{Config as RawConfig, Environment, Map};
use lookout_common::{LookoutError, Result};
use serde::{Deserialize, Deserializer};

const DEFAULT_DAYS: i64 = 1;
const DEFAULT_MAX_RESULTS: u32 = 2;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 110;

/// Immutable process-wide settings. Loaded once, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// xAI bearer token.
    pub grok_api_key: String,
    /// Discord webhook endpoint (the URL embeds its own secret).
    pub discord_webhook_url: String,
    /// Account handles to watch, in configured order. May be empty; the run
    /// entry point rejects an empty list before any network call.
    #[serde(default, deserialize_with = "handle_list")]
    pub x_handles: Vec<String>,
    /// Lookback window in days.
    #[serde(default = "default_days")]
    pub days: i64,
    /// Per-account result cap passed to the search provider.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Outbound HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,
    /// When set, the raw search envelope is posted to the webhook before the
    /// summary message.
    #[serde(default, deserialize_with = "flag")]
    pub debug: bool,
}

fn default_days() -> i64 {
    DEFAULT_DAYS
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Comma-separated handles, trimmed, empties dropped, order preserved.
fn handle_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Csv(String),
        List(Vec<String>),
    }

    let parts = match Raw::deserialize(deserializer)? {
        Raw::Csv(s) => s.split(',').map(str::to_string).collect(),
        Raw::List(v) => v,
    };

    Ok(parts
        .into_iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect())
}

/// Boolean flags arrive as whatever the scheduler exported: `1`, `true`,
/// `yes`, `on` all count as enabled.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Int(n) => n != 0,
        Raw::Str(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    })
}

/// Builder hiding the `config` crate wiring (environment source + overrides).
pub struct ConfigLoader {
    env: Environment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Start from the real process environment.
    pub fn new() -> Self {
        Self {
            env: Environment::default().try_parsing(true),
        }
    }

    /// Replace the environment with an explicit variable map. Used by tests
    /// so config loading never races on process-global state.
    ///
    /// ```
    /// use lookout_config::ConfigLoader;
    ///
    /// let cfg = ConfigLoader::with_vars([
    ///     ("GROK_API_KEY", "xai-test"),
    ///     ("DISCORD_WEBHOOK_URL", "https://discord.example/hook"),
    ///     ("X_HANDLES", "alice, bob"),
    /// ])
    /// .load()
    /// .expect("valid config");
    ///
    /// assert_eq!(cfg.x_handles, vec!["alice", "bob"]);
    /// assert_eq!(cfg.days, 1);
    /// assert_eq!(cfg.max_results, 2);
    /// assert!(!cfg.debug);
    /// ```
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            env: Environment::default().try_parsing(true).source(Some(map)),
        }
    }

    /// Consume the builder and deserialize the environment into the typed
    /// [`Config`]. Missing required variables fail here, before any network
    /// call is attempted.
    pub fn load(self) -> Result<Config> {
        let raw = RawConfig::builder()
            .add_source(self.env)
            .build()
            .map_err(|e| LookoutError::Config(e.to_string()))?;

        raw.try_deserialize::<Config>()
            .map_err(|e| LookoutError::Config(e.to_string()))
    }
}
