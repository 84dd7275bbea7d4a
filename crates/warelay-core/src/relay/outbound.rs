//! WhatsApp → Telegram.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Span};

use crate::{
    codec::RelayCodec,
    domain::{ChatEvent, ChatId, WhatsAppEvent},
    ports::TelegramPort,
};

pub struct OutboundRelay {
    telegram: Arc<dyn TelegramPort>,
    codec: RelayCodec,
    group_chat_id: ChatId,
    span: Span,
}

impl OutboundRelay {
    pub fn new(
        telegram: Arc<dyn TelegramPort>,
        codec: RelayCodec,
        group_chat_id: ChatId,
        span: Span,
    ) -> Self {
        Self {
            telegram,
            codec,
            group_chat_id,
            span,
        }
    }

    /// Relay one WhatsApp message into the group.
    ///
    /// A failed send is logged and the message is dropped.
    pub async fn deliver(&self, event: &ChatEvent) {
        let text = self.codec.encode_event(event);

        match self.telegram.send_text(self.group_chat_id, &text, None).await {
            Ok(sent) => self.span.in_scope(|| {
                debug!(
                    wa_message_id = %event.id,
                    phone = %event.sender_phone,
                    tg_message_id = sent.message_id.0,
                    "relayed message to telegram"
                )
            }),
            Err(e) => self.span.in_scope(|| {
                error!(
                    wa_message_id = %event.id,
                    phone = %event.sender_phone,
                    "sending Telegram message failed -> {e}"
                )
            }),
        }
    }

    /// Drain WhatsApp events until the source closes the channel.
    pub async fn run(&self, mut events: mpsc::Receiver<WhatsAppEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                WhatsAppEvent::Message(msg) => {
                    self.span.in_scope(|| {
                        debug!(
                            wa_message_id = %msg.id,
                            ts = %msg.timestamp,
                            "received a message from [{}] ({})",
                            msg.sender_name,
                            msg.sender_phone
                        )
                    });
                    self.deliver(&msg).await;
                }
                WhatsAppEvent::Qr(code) => self.span.in_scope(|| {
                    info!(pairing_code = %code, "WhatsApp login required, waiting for QR pairing")
                }),
                WhatsAppEvent::Connected => self
                    .span
                    .in_scope(|| info!("whatsapp account has been connected successfully")),
                WhatsAppEvent::Disconnected(reason) => self
                    .span
                    .in_scope(|| warn!("whatsapp disconnected: {reason}")),
                WhatsAppEvent::Error(e) => self.span.in_scope(|| warn!("whatsapp error: {e}")),
            }
        }
        self.span
            .in_scope(|| info!("whatsapp event stream closed; outbound relay stopped"));
    }
}
