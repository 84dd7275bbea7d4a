//! In-memory ports for relay tests.

use std::sync::{
    atomic::{AtomicI32, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, DeliveryOutcome, MessageId, MessageRef},
    errors::Error,
    ports::{Messenger, TelegramPort},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentText {
    pub chat_id: ChatId,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

#[derive(Default)]
pub struct RecordingTelegram {
    fail: bool,
    attempts: AtomicUsize,
    next_id: AtomicI32,
    sent: Mutex<Vec<SentText>>,
}

impl RecordingTelegram {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentText> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelegramPort for RecordingTelegram {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::External("telegram error: Bad Request".to_string()));
        }
        self.sent.lock().unwrap().push(SentText {
            chat_id,
            text: text.to_string(),
            reply_to,
        });
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1000),
        })
    }
}

pub struct RecordingMessenger {
    outcome: DeliveryOutcome,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    pub fn accepting() -> Self {
        Self::with(DeliveryOutcome::delivered("chat has been replied"))
    }

    pub fn with(outcome: DeliveryOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn forward(&self, phone: &str, message: &str) -> DeliveryOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        self.outcome.clone()
    }
}
