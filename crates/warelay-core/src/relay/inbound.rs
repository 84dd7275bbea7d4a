//! Telegram → WhatsApp: agent replies to relayed envelopes.

use std::sync::Arc;

use tracing::{debug, info, warn, Span};

use crate::{
    codec::RelayCodec,
    config::InboundSettings,
    domain::{ChatKind, IncomingMessage, IncomingUpdate, UserId},
    ports::{Messenger, TelegramPort},
};

/// Why an update was not forwarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NoMessage,
    NotAReply,
    NotRepliedToBot,
    NotAnEnvelope,
    ForeignChat,
    EmptyReply,
}

/// Terminal action for one update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundOutcome {
    Skipped(SkipReason),
    /// Messenger accepted the reply and the agent was told.
    Forwarded { phone: String },
    /// Messenger rejected the reply. `notified` says whether the agent saw a notice.
    DeliveryFailed { phone: String, notified: bool },
    /// Messenger accepted the reply but the Telegram confirmation could not be sent.
    ReplyFailed { phone: String },
}

pub struct InboundRelay {
    telegram: Arc<dyn TelegramPort>,
    messenger: Arc<dyn Messenger>,
    codec: RelayCodec,
    bot_id: UserId,
    group_title: Option<String>,
    notify_delivery_failure: bool,
    span: Span,
}

impl InboundRelay {
    pub fn new(
        telegram: Arc<dyn TelegramPort>,
        messenger: Arc<dyn Messenger>,
        codec: RelayCodec,
        bot_id: UserId,
        settings: &InboundSettings,
        span: Span,
    ) -> Self {
        Self {
            telegram,
            messenger,
            codec,
            bot_id,
            group_title: settings.group_title.clone(),
            notify_delivery_failure: settings.notify_delivery_failure,
            span,
        }
    }

    /// Process one update to completion. Never fails: every error ends this
    /// update only, so the caller can keep pulling.
    pub async fn handle(&self, update: &IncomingUpdate) -> InboundOutcome {
        let Some(msg) = &update.message else {
            return InboundOutcome::Skipped(SkipReason::NoMessage);
        };
        self.handle_message(msg).await
    }

    pub async fn handle_message(&self, msg: &IncomingMessage) -> InboundOutcome {
        let phone = match self.target_phone(msg) {
            Ok(phone) => phone,
            Err(reason) => {
                self.span.in_scope(|| {
                    debug!(
                        chat_id = msg.chat_id.0,
                        message_id = msg.message_id.0,
                        ?reason,
                        "ignoring telegram message"
                    )
                });
                return InboundOutcome::Skipped(reason);
            }
        };

        let Some(text) = msg.text.as_deref().filter(|t| !t.trim().is_empty()) else {
            return InboundOutcome::Skipped(SkipReason::EmptyReply);
        };

        let outcome = self.messenger.forward(&phone, text).await;
        if !outcome.sent {
            let notice = format!("failed to reply chat from recipient [{phone}]");
            self.span.in_scope(|| {
                warn!(
                    phone = %phone,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "{notice}"
                )
            });

            if !self.notify_delivery_failure {
                return InboundOutcome::DeliveryFailed {
                    phone,
                    notified: false,
                };
            }
            let notified = self.reply(msg, &notice).await;
            return InboundOutcome::DeliveryFailed { phone, notified };
        }

        if !self.reply(msg, &outcome.reply_text).await {
            return InboundOutcome::ReplyFailed { phone };
        }

        self.span.in_scope(|| {
            info!(
                phone = %phone,
                chat_id = msg.chat_id.0,
                "agent reply forwarded"
            )
        });
        InboundOutcome::Forwarded { phone }
    }

    /// Run the filter chain. Order matters: the chat check runs after decoding.
    fn target_phone(&self, msg: &IncomingMessage) -> Result<String, SkipReason> {
        let replied = msg.reply_to.as_ref().ok_or(SkipReason::NotAReply)?;

        let from_bot = replied
            .author
            .as_ref()
            .is_some_and(|a| a.is_bot && a.id == self.bot_id);
        if !from_bot {
            return Err(SkipReason::NotRepliedToBot);
        }

        let envelope = replied
            .text
            .as_deref()
            .and_then(|t| self.codec.decode(t))
            .ok_or(SkipReason::NotAnEnvelope)?;

        if msg.chat_kind != ChatKind::Group
            && msg.chat_title.as_deref() != self.group_title.as_deref()
        {
            return Err(SkipReason::ForeignChat);
        }

        Ok(envelope.phone)
    }

    async fn reply(&self, msg: &IncomingMessage, text: &str) -> bool {
        match self
            .telegram
            .send_text(msg.chat_id, text, Some(msg.message_id))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                self.span
                    .in_scope(|| warn!("failed to send the message -> {e}"));
                false
            }
        }
    }
}
