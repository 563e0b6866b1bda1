//! Console reporting for the inbound client.
//!
//! Every gateway failure is described on the writer and turned into `false` (send) or a
//! no-op (history); nothing is propagated to the caller.

use std::io::Write;

use crate::client::{InboundClient, InboundError, SendOutcome};
use crate::config::{Settings, ENV_INBOUND_API_KEY};
use crate::protocol::{HistoryQuery, OutboundMessage};

/// Characters of message content shown per history entry.
pub const PREVIEW_CHARS: usize = 100;

const EMPTY_REPLY: &str = "[Empty reply]";

/// Send `msg` and describe the outcome. Returns true when the gateway accepted the message.
pub async fn send_message<W: Write>(
    client: &InboundClient,
    msg: &OutboundMessage,
    out: &mut W,
) -> bool {
    let _ = writeln!(out, "\n[client] sending message to gateway...");
    let _ = writeln!(out, "response mode: {}", msg.response_mode);
    if client.has_api_key() {
        let _ = writeln!(out, "using API key authentication");
    } else {
        let _ = writeln!(
            out,
            "warning: no API key configured (requests fail if the gateway requires auth)"
        );
    }

    match client.post_inbound(msg).await {
        Ok(SendOutcome::Replied(reply)) => {
            let _ = writeln!(out, "ok: sync call succeeded (HTTP 200)");
            let _ = writeln!(out, "Reply: {}", reply.as_deref().unwrap_or(EMPTY_REPLY));
            true
        }
        Ok(SendOutcome::Accepted) => {
            let _ = writeln!(out, "ok: async request accepted (HTTP 202)");
            true
        }
        Ok(SendOutcome::Completed(reply)) => {
            let _ = writeln!(out, "ok: received synchronous response (HTTP 200)");
            if let Some(reply) = reply {
                let _ = writeln!(out, "Reply: {}", reply);
            }
            true
        }
        Err(InboundError::Unauthorized { body }) => {
            write_auth_failure(out, &body);
            false
        }
        Err(InboundError::Status { status, body }) => {
            let _ = writeln!(
                out,
                "error: {} request failed: {} - {}",
                msg.response_mode,
                status.as_u16(),
                body
            );
            false
        }
        Err(InboundError::InvalidJson { body }) => {
            let _ = writeln!(out, "error: response is not valid JSON: {}", body);
            false
        }
        Err(e @ InboundError::Request(_)) => {
            log::debug!("inbound send failed: {:?}", e);
            let _ = writeln!(out, "error: {}", e);
            false
        }
    }
}

/// Fetch recent history and print one preview line per message.
pub async fn check_history<W: Write>(client: &InboundClient, query: &HistoryQuery, out: &mut W) {
    let _ = writeln!(out, "\n[client] querying conversation history...");
    match client.fetch_history(query).await {
        Ok(messages) => {
            let _ = writeln!(out, "ok: fetched {} messages:", messages.len());
            for m in &messages {
                let _ = writeln!(
                    out,
                    "  - [{}]: {}...",
                    m.role(),
                    preview(&m.content(), PREVIEW_CHARS)
                );
            }
        }
        Err(InboundError::Unauthorized { body }) => write_auth_failure(out, &body),
        Err(InboundError::Status { status, body }) => {
            let _ = writeln!(out, "error: fetch failed: {} - {}", status.as_u16(), body);
        }
        Err(e) => {
            log::debug!("history fetch failed: {:?}", e);
            let _ = writeln!(out, "error: {}", e);
        }
    }
}

/// Print the resolved settings, with the API key masked.
pub fn render_banner<W: Write>(settings: &Settings, out: &mut W) {
    let _ = writeln!(out, "settings:");
    let _ = writeln!(out, "  Gateway URL: {}", settings.gateway_url);
    let _ = writeln!(out, "  User ID: {}", settings.user_id);
    let _ = writeln!(out, "  Project ID: {}", settings.project_id);
    let _ = writeln!(out, "  Response Mode: {}", settings.response_mode);
    match settings.inbound_api_key {
        Some(ref key) => {
            let _ = writeln!(out, "  API Key: {}", mask_api_key(key));
        }
        None => {
            let _ = writeln!(out, "  API Key: (not set)");
        }
    }
}

fn write_auth_failure<W: Write>(out: &mut W, body: &str) {
    let _ = writeln!(out, "error: authentication failed (HTTP 401): {}", body);
    let _ = writeln!(
        out,
        "hint: set the {} environment variable or inboundApiKey in the settings file",
        ENV_INBOUND_API_KEY
    );
}

/// All but the last four characters replaced by `*`.
pub fn mask_api_key(key: &str) -> String {
    let n = key.chars().count();
    let hidden = n.saturating_sub(4);
    let tail: String = key.chars().skip(hidden).collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

/// First `max` characters of `content` (never splits a character).
pub fn preview(content: &str, max: usize) -> &str {
    match content.char_indices().nth(max) {
        Some((i, _)) => &content[..i],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask_api_key("abcdefgh"), "****efgh");
        assert_eq!(mask_api_key("test"), "test");
        assert_eq!(mask_api_key("ab"), "ab");
        assert_eq!(mask_api_key(""), "");
    }

    #[test]
    fn preview_truncates_by_characters() {
        let long = "a".repeat(200);
        assert_eq!(preview(&long, 100).len(), 100);
        assert_eq!(preview("short", 100), "short");
        let wide = "你".repeat(150);
        assert_eq!(preview(&wide, 100).chars().count(), 100);
    }

    #[test]
    fn banner_masks_key_and_reports_missing_key() {
        let mut settings = Settings::default();
        settings.inbound_api_key = Some("supersecret".into());
        let mut out = Vec::new();
        render_banner(&settings, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("API Key: *******cret"));
        assert!(!text.contains("supersecret"));

        settings.inbound_api_key = None;
        let mut out = Vec::new();
        render_banner(&settings, &mut out);
        assert!(String::from_utf8(out).unwrap().contains("API Key: (not set)"));
    }
}
