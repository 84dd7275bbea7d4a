use async_trait::async_trait;

use crate::{
    domain::{ChatId, DeliveryOutcome, MessageId, MessageRef},
    Result,
};

/// Outbound side of Telegram.
///
/// Shared between the WhatsApp event task and the update loop, so
/// implementations must be callable concurrently.
#[async_trait]
pub trait TelegramPort: Send + Sync {
    /// Send plain text, optionally as a reply to `reply_to`.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;
}

/// Delivery sink for agent replies headed back to WhatsApp.
///
/// A forward is a single attempt; failures are reported in the outcome, not
/// as an error.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn forward(&self, phone: &str, message: &str) -> DeliveryOutcome;
}
