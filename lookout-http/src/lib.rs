//! Minimal HTTP client with safe logging and flexible per-request options.
//!
//! - Request options: headers, bearer auth, timeout
//! - Exactly one attempt per call; degradation policy belongs to the caller
//! - Redacts the Authorization header and never logs secret values
//! - Success bodies follow the response content type: JSON parses into
//!   [`Payload::Json`], anything else is returned as [`Payload::Text`]
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), lookout_http::HttpError> {
//! let client = lookout_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", lookout_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! There is deliberately no retry loop here. The one caller that degrades
//! under failure (the search client) implements an explicit two-tier
//! `attempt(full) orElse attempt(reduced)` policy on top of this wrapper;
//! a generic N-retry loop would blur that intent.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lookout/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const SNIPPET_MAX: usize = 500;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    /// Network or timeout failure before a response arrived ("TransportError").
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    /// Non-2xx response from the upstream service ("UpstreamHTTPError").
    #[error("server returned error {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        body: String,
    },
}

// ==============================
// Auth & request options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
#[derive(Clone, Debug, Default)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Unauthenticated (e.g. a webhook whose URL embeds its own secret).
    #[default]
    None,
}

/// Per-request tuning knobs.
///
/// ```
/// use lookout_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Auth::Bearer("token"),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Auth<'a>,
    pub headers: Option<HeaderMap>,
}

/// A successful response body, shaped by the response content type.
#[derive(Clone, Debug)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use lookout_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET and decode a JSON body into `T`.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (bytes, _) = self.request(Method::GET, path, None, opts).await?;
        decode_json(&bytes)
    }

    /// POST a JSON body and decode the JSON response into `T`.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let (resp, _) = self.request(Method::POST, path, Some(bytes), opts).await?;
        decode_json(&resp)
    }

    /// POST a JSON body and return whatever came back: parsed JSON when the
    /// response content type says JSON, the raw text otherwise.
    pub async fn post<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<Payload, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let (resp, headers) = self.request(Method::POST, path, Some(bytes), opts).await?;

        if is_json(&headers) {
            let value = serde_json::from_slice(&resp)
                .map_err(|e| HttpError::Decode(e.to_string(), snip_body(&resp)))?;
            Ok(Payload::Json(value))
        } else {
            Ok(Payload::Text(String::from_utf8_lossy(&resp).into_owned()))
        }
    }

    // Single attempt: build, send, read, classify. No retry, no backoff.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        opts: RequestOpts<'_>,
    ) -> Result<(Vec<u8>, HeaderMap), HttpError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut rb = self.inner.request(method.clone(), url.clone()).timeout(timeout);

        rb = rb.header(reqwest::header::ACCEPT, "application/json");
        if let Some(bytes) = body {
            rb = rb.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        // Caller headers merge over the defaults above.
        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        let auth_kind = match &opts.auth {
            Auth::Bearer(tok) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
                "bearer"
            }
            Auth::None => "none",
        };

        tracing::debug!(
            method = %method,
            host_path = %format!("{}{}", url.domain().unwrap_or("-"), url.path()),
            timeout_ms = timeout.as_millis() as u64,
            auth_kind,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(message = %message, "http.network_error");
            HttpError::Network(message)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| {
                let message = err.to_string();
                tracing::warn!(message = %message, "http.network_error.body");
                HttpError::Network(message)
            })?
            .to_vec();

        tracing::debug!(
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            "http.response"
        );

        if status.is_success() {
            return Ok((bytes, headers));
        }

        let message = extract_error_message(&bytes);
        let snippet = snip_body(&bytes);
        tracing::warn!(%status, message = %message, body_snippet = %snippet, "http.error");
        Err(HttpError::Api {
            status,
            message,
            body: snippet,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::warn!(
            serde_err = %e,
            body_snippet = %snip_body(bytes),
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snip_body(bytes))
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

/// Pull a human-readable message out of common provider error bodies,
/// falling back to a raw snippet.
fn extract_error_message(body: &[u8]) -> String {
    // OpenAI/xAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct NestedEnv {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<NestedEnv>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        snip.truncate(SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // Trim outer spaces/quotes, then strip every ASCII whitespace byte.
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    reqwest::header::HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_api_key(" \"xai-abc \n\" ").unwrap(), "xai-abc");
        assert_eq!(sanitize_api_key("xai-a b c").unwrap(), "xai-abc");
    }

    #[test]
    fn sanitize_rejects_non_ascii() {
        assert!(sanitize_api_key("xai-ключ").is_err());
    }

    #[test]
    fn error_message_prefers_nested_shape() {
        let body = br#"{"error":{"message":"quota exceeded"}}"#;
        assert_eq!(extract_error_message(body), "quota exceeded");
    }

    #[test]
    fn error_message_falls_back_through_flat_fields() {
        assert_eq!(
            extract_error_message(br#"{"detail":"not found"}"#),
            "not found"
        );
        assert_eq!(
            extract_error_message(br#"{"error":"bad request"}"#),
            "bad request"
        );
        assert_eq!(extract_error_message(b"plain text body"), "plain text body");
    }

    #[test]
    fn snip_caps_long_bodies() {
        let long = "x".repeat(600);
        let snip = snip_body(long.as_bytes());
        assert_eq!(snip.len(), 503);
        assert!(snip.ends_with("..."));
    }

    #[test]
    fn json_content_type_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(is_json(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));

        assert!(!is_json(&HeaderMap::new()));
    }
}
