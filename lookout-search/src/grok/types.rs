//! Wire types for the xAI chat-completions endpoint (live-search mode).

use serde::{Deserialize, Serialize};

// ==============================
// Request
// ==============================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub response_format: ResponseFormat,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub search_parameters: SearchParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The live-search block: `mode: "on"` forces search, `sources` restricts
/// results to the listed X handles, and the date bounds are a first-pass
/// filter on the provider side (the local window filter stays authoritative).
#[derive(Debug, Clone, Serialize)]
pub struct SearchParameters {
    pub mode: String,
    pub sources: Vec<SearchSource>,
    pub from_date: String,
    pub to_date: String,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub included_x_handles: Vec<String>,
}

impl SearchSource {
    pub fn x_handles(handles: &[String]) -> Self {
        Self {
            kind: "x".to_string(),
            included_x_handles: handles.to_vec(),
        }
    }
}

// ==============================
// Response envelope
// ==============================

/// Outer chat-completion envelope. Everything except `choices` is optional
/// noise we keep only so debug notifications can echo the raw response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub message: Option<AssistantMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message. `content` is itself a JSON-encoded string; the
/// second-stage decode lives in [`super::extract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

// ==============================
// Model listing (probe mode)
// ==============================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub owned_by: Option<String>,
}
