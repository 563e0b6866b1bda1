//! Inbound gateway HTTP client (http://127.0.0.1:18789 by default).
//! Sends chat messages to `/atypica/inbound` and reads `/atypica/messages`.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::Settings;
use crate::protocol::{
    HistoryMessage, HistoryQuery, HistoryResponse, OutboundMessage, ResponseMode, SyncReply,
};

const INBOUND_PATH: &str = "/atypica/inbound";
const MESSAGES_PATH: &str = "/atypica/messages";

/// Client for the gateway's inbound messaging API.
#[derive(Clone)]
pub struct InboundClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    #[error("authentication failed (HTTP 401): {body}")]
    Unauthorized { body: String },
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("response is not valid JSON: {body}")]
    InvalidJson { body: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Successful result of an inbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Sync mode, HTTP 200. `None` when the body had no `reply` field.
    Replied(Option<String>),
    /// Async mode, HTTP 202.
    Accepted,
    /// Async mode but the gateway answered synchronously with HTTP 200.
    Completed(Option<String>),
}

impl InboundClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.gateway_url, settings.inbound_api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// JSON content type always; `Authorization: Bearer <key>` only when a key is configured.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref key) = self.api_key {
            match HeaderValue::from_str(&format!("Bearer {}", key)) {
                Ok(v) => {
                    headers.insert(AUTHORIZATION, v);
                }
                Err(e) => log::warn!("inbound api key is not a valid header value: {}", e),
            }
        }
        headers
    }

    /// POST /atypica/inbound — interpret the status according to the message's response mode.
    pub async fn post_inbound(&self, msg: &OutboundMessage) -> Result<SendOutcome, InboundError> {
        let url = format!("{}{}", self.base_url, INBOUND_PATH);
        log::debug!("POST {} (mode {})", url, msg.response_mode);
        let res = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(msg)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        log::debug!("POST {} -> {}", url, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(InboundError::Unauthorized { body });
        }

        match msg.response_mode {
            ResponseMode::Sync => {
                if status != StatusCode::OK {
                    return Err(InboundError::Status { status, body });
                }
                let data: SyncReply = serde_json::from_str(&body)
                    .map_err(|_| InboundError::InvalidJson { body: body.clone() })?;
                Ok(SendOutcome::Replied(data.reply_text()))
            }
            ResponseMode::Async => match status {
                StatusCode::ACCEPTED => Ok(SendOutcome::Accepted),
                StatusCode::OK => {
                    // Tolerate a non-JSON body here; the request was still accepted.
                    let data: SyncReply = serde_json::from_str(&body).unwrap_or_default();
                    Ok(SendOutcome::Completed(data.reply_text()))
                }
                _ => Err(InboundError::Status { status, body }),
            },
        }
    }

    /// GET /atypica/messages — recent conversation history.
    pub async fn fetch_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryMessage>, InboundError> {
        let url = format!("{}{}", self.base_url, MESSAGES_PATH);
        log::debug!("GET {} (limit {})", url, query.limit);
        let res = self
            .client
            .get(&url)
            .headers(self.headers())
            .query(query)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        log::debug!("GET {} -> {}", url, status);

        match status {
            StatusCode::OK => {
                let data: HistoryResponse = serde_json::from_str(&body)
                    .map_err(|_| InboundError::InvalidJson { body: body.clone() })?;
                Ok(data.messages)
            }
            StatusCode::UNAUTHORIZED => Err(InboundError::Unauthorized { body }),
            _ => Err(InboundError::Status { status, body }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_include_bearer_when_key_set() {
        let c = InboundClient::new("http://127.0.0.1:18789/", Some("secret".into()));
        let h = c.headers();
        assert_eq!(h.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(h.get(AUTHORIZATION).unwrap(), "Bearer secret");
        assert_eq!(c.base_url(), "http://127.0.0.1:18789");
    }

    #[test]
    fn headers_omit_authorization_without_key() {
        for key in [None, Some(String::new()), Some("   ".to_string())] {
            let c = InboundClient::new("http://127.0.0.1:18789", key);
            let h = c.headers();
            assert!(h.get(AUTHORIZATION).is_none());
            assert!(!c.has_api_key());
            assert_eq!(h.get(CONTENT_TYPE).unwrap(), "application/json");
        }
    }

    #[test]
    fn from_settings_uses_resolved_key() {
        let mut settings = Settings::default();
        settings.inbound_api_key = None;
        let c = InboundClient::from_settings(&settings);
        assert!(c.headers().get(AUTHORIZATION).is_none());
    }
}
