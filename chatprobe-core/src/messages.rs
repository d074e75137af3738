//! Listing of the rendered bot bubbles.
use crate::extract::strip_thinking_lines;
use crate::types::BotMessage;
use chatprobe_config::SelectorConfig;
use chatprobe_drivers::ChatPage;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BotMessageReader {
    container: String,
    text: String,
    thinking_token: String,
}

impl BotMessageReader {
    pub fn from_config(cfg: &SelectorConfig) -> Self {
        Self {
            container: cfg.bot_message.clone(),
            text: cfg.bot_message_text.clone(),
            thinking_token: cfg.thinking_token.clone(),
        }
    }

    /// Every bot message in document order. A failed query gives an empty list.
    pub async fn list_bot_messages(&self, page: &dyn ChatPage) -> Vec<BotMessage> {
        let snaps = match page.query_scoped(&self.container, &self.text).await {
            Ok(snaps) => snaps,
            Err(e) => {
                warn!(target: "chatprobe.messages", error = %e, "failed to list bot messages");
                return Vec::new();
            }
        };
        debug!(target: "chatprobe.messages", count = snaps.len(), "bot messages listed");
        snaps
            .into_iter()
            .map(|snap| BotMessage {
                id: snap.id,
                text: strip_thinking_lines(&snap.text, &self.thinking_token),
                html: snap.html,
                original_text: snap.text,
            })
            .collect()
    }
}
