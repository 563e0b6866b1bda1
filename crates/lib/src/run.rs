//! One client invocation: banner, send, optional wait, history.

use std::io::Write;
use std::time::Duration;

use crate::client::InboundClient;
use crate::config::Settings;
use crate::protocol::{HistoryQuery, OutboundMessage, ResponseMode, DEFAULT_HISTORY_LIMIT};
use crate::report;

/// Message sent when the caller supplies no text.
pub const DEFAULT_MESSAGE: &str = "你好啊";

/// Pause before polling history in async mode, giving the agent time to act.
pub const ASYNC_HISTORY_DELAY: Duration = Duration::from_secs(5);

/// Per-invocation options (from the command line).
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Message words; joined with spaces.
    pub words: Vec<String>,
    /// Overrides `Settings::response_mode` when set.
    pub mode: Option<ResponseMode>,
    pub no_history: bool,
    pub history_limit: u32,
    pub history_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            words: Vec::new(),
            mode: None,
            no_history: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history_delay: ASYNC_HISTORY_DELAY,
        }
    }
}

/// Join message words; empty or whitespace-only input becomes the default greeting.
pub fn message_text(words: &[String]) -> String {
    let joined = words.join(" ");
    let text = joined.trim();
    if text.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        text.to_string()
    }
}

/// Run the send-then-query flow. Returns whether the send succeeded.
pub async fn run<W: Write>(
    client: &InboundClient,
    settings: &Settings,
    options: &RunOptions,
    out: &mut W,
) -> bool {
    let mode = options.mode.unwrap_or(settings.response_mode);
    let mut shown = settings.clone();
    shown.response_mode = mode;
    report::render_banner(&shown, out);

    let msg = OutboundMessage {
        user_id: settings.user_id.clone(),
        project_id: settings.project_id.clone(),
        message: message_text(&options.words),
        response_mode: mode,
    };
    let sent = report::send_message(client, &msg, out).await;
    if !sent || options.no_history {
        return sent;
    }

    if mode == ResponseMode::Async {
        let _ = writeln!(
            out,
            "\nwaiting {:?} for the agent to act and push its webhook...",
            options.history_delay
        );
        let _ = out.flush();
        tokio::time::sleep(options.history_delay).await;
    }

    let query = HistoryQuery {
        user_id: settings.user_id.clone(),
        project_id: settings.project_id.clone(),
        limit: options.history_limit,
    };
    report::check_history(client, &query, out).await;
    sent
}
