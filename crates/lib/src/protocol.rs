//! Inbound gateway wire types (send, reply, history).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Default page size for the message-history query.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Whether the caller waits for the agent's reply or only for an acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Reply is returned in the 200 response body.
    Sync,
    /// Request is acknowledged with 202; the reply is delivered later.
    Async,
}

impl ResponseMode {
    /// "sync" (case-insensitive, surrounding whitespace ignored) is `Sync`; anything else is `Async`.
    pub fn normalize(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("sync") {
            ResponseMode::Sync
        } else {
            ResponseMode::Async
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Sync => "sync",
            ResponseMode::Async => "async",
        }
    }
}

impl std::fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /atypica/inbound`: `{ "userId", "projectId", "message", "responseMode" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub user_id: String,
    pub project_id: String,
    pub message: String,
    pub response_mode: ResponseMode,
}

/// Query string of `GET /atypica/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: String,
    pub project_id: String,
    pub limit: u32,
}

/// 200 body of a synchronous inbound call. `reply` may be any JSON value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReply {
    #[serde(default)]
    pub reply: Option<serde_json::Value>,
}

impl SyncReply {
    /// Printable reply: strings as-is, other values as JSON text.
    pub fn reply_text(&self) -> Option<String> {
        self.reply.as_ref().map(|v| value_text(v).into_owned())
    }
}

/// 200 body of the message-history query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// One entry of the conversation history. Content may be plain text or structured parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub role: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

impl HistoryMessage {
    pub fn role(&self) -> Cow<'_, str> {
        self.role
            .as_ref()
            .map(value_text)
            .unwrap_or(Cow::Borrowed("unknown"))
    }

    pub fn content(&self) -> Cow<'_, str> {
        self.content
            .as_ref()
            .map(value_text)
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// A JSON string without quotes; anything else as compact JSON.
pub fn value_text(v: &serde_json::Value) -> Cow<'_, str> {
    match v {
        serde_json::Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
