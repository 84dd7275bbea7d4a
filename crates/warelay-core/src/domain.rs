use chrono::{DateTime, FixedOffset};

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// One inbound WhatsApp message, normalized by the event source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEvent {
    pub id: String,
    pub sender_phone: String,
    pub sender_name: String,
    pub timestamp: DateTime<FixedOffset>,
    pub body: String,
}

/// Everything a WhatsApp event source can emit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WhatsAppEvent {
    Message(ChatEvent),
    /// Pairing code to be scanned from the phone (new login).
    Qr(String),
    Connected,
    Disconnected(String),
    Error(String),
}

/// Telegram chat type as reported by the Bot API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Author of a Telegram message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub is_bot: bool,
}

/// The message an agent replied to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepliedMessage {
    pub message_id: MessageId,
    pub author: Option<Author>,
    pub text: Option<String>,
}

/// Telegram-agnostic view of an incoming message (the agent side).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub chat_kind: ChatKind,
    pub chat_title: Option<String>,
    pub text: Option<String>,
    pub reply_to: Option<RepliedMessage>,
}

/// One Telegram update. Updates without a message (edits, polls...) carry `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingUpdate {
    pub message: Option<IncomingMessage>,
}

/// Result of one messenger forward attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub sent: bool,
    pub reply_text: String,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(reply_text: impl Into<String>) -> Self {
        Self {
            sent: true,
            reply_text: reply_text.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            sent: false,
            reply_text: String::new(),
            error: Some(error.into()),
        }
    }
}
