use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{info, warn};

use common::{Error, ReportSink, Result, ScanSummary};
use strategy::report::render_alert;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Pushes a compact scan alert to every configured chat.
///
/// Delivery succeeds if at least one chat received the message; failures
/// for individual chats are logged and otherwise ignored.
pub struct TelegramSink {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramSink {
    pub fn new(token: impl Into<String>, chat_ids: &[i64]) -> Self {
        info!(chats = chat_ids.len(), "Telegram notifier initialized");
        Self {
            bot: Bot::new(token),
            chat_ids: chat_ids.iter().map(|&id| ChatId(id)).collect(),
        }
    }

    /// Send a fixed message to verify token and chat ids.
    pub async fn send_test_message(&self) -> Result<()> {
        self.send(&test_message()).await
    }

    async fn send(&self, message: &str) -> Result<()> {
        let delivered = send_alert(&self.bot, &self.chat_ids, message).await;
        if delivered == 0 {
            return Err(Error::Notify(format!(
                "message not delivered to any of {} chat(s)",
                self.chat_ids.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, summary: &ScanSummary) -> Result<()> {
        self.send(&clip_message(&render_alert(summary))).await
    }
}

/// Send a message to all chat IDs. Returns how many chats received it.
pub async fn send_alert(bot: &Bot, chat_ids: &[ChatId], message: &str) -> usize {
    let mut delivered = 0;
    for &chat_id in chat_ids {
        match bot.send_message(chat_id, message).await {
            Ok(_) => delivered += 1,
            Err(e) => warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert"),
        }
    }
    delivered
}

pub fn test_message() -> String {
    "SMA dispersion scanner: test notification.\n\
     If you can read this, alert delivery is configured correctly."
        .to_string()
}

/// Truncate to Telegram's limit on a char boundary, marking the cut.
pub fn clip_message(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        return message.to_string();
    }
    const MARKER: &str = "\n…(truncated)";
    let keep = MAX_MESSAGE_CHARS - MARKER.chars().count();
    let mut clipped: String = message.chars().take(keep).collect();
    clipped.push_str(MARKER);
    clipped
}
