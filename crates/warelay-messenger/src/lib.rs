//! HTTP messenger: hands agent replies to the WhatsApp sending service.
//!
//! One POST per reply, no retries. The service answers with the shared
//! response envelope and a non-null `data` means the message went out.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn, Span};

use warelay_core::{
    config::MessengerConfig, domain::DeliveryOutcome, errors::Error, ports::Messenger,
    response::ResponseEnvelope, Result,
};

pub const REPLIED_NOTE: &str = "chat has been replied";

#[derive(Debug, Serialize)]
struct ForwardPayload<'a> {
    phone: &'a str,
    message: &'a str,
}

#[derive(Clone, Debug)]
pub struct HttpMessenger {
    url: String,
    http: reqwest::Client,
    span: Span,
}

impl HttpMessenger {
    pub fn new(cfg: &MessengerConfig, span: Span) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.tls_insecure)
            .build()
            .map_err(|e| Error::External(format!("messenger client build error: {e}")))?;
        Ok(Self {
            url: cfg.url.clone(),
            http,
            span,
        })
    }

    async fn post(&self, phone: &str, message: &str) -> Result<ResponseEnvelope> {
        let resp = self
            .http
            .post(&self.url)
            .json(&ForwardPayload { phone, message })
            .send()
            .await
            .map_err(|e| Error::External(format!("messenger request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::External(format!("messenger read error: {e}")))?;

        serde_json::from_slice::<ResponseEnvelope>(&body).map_err(|e| {
            Error::External(format!(
                "messenger returned {status} with unreadable body: {e}: {}",
                String::from_utf8_lossy(&body).chars().take(200).collect::<String>()
            ))
        })
    }
}

/// Delivery rule: the reply went out iff the envelope carries data.
pub fn interpret(envelope: &ResponseEnvelope) -> DeliveryOutcome {
    if envelope.data.is_some() {
        DeliveryOutcome::delivered(REPLIED_NOTE)
    } else {
        DeliveryOutcome::failed(envelope.failure_reason())
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn forward(&self, phone: &str, message: &str) -> DeliveryOutcome {
        let outcome = match self.post(phone, message).await {
            Ok(envelope) => interpret(&envelope),
            Err(e) => DeliveryOutcome::failed(e.to_string()),
        };

        self.span.in_scope(|| {
            if outcome.sent {
                debug!(phone, "[to:{phone}] message sent");
            } else {
                warn!(
                    phone,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "[to:{phone}] failed to send message"
                );
            }
        });
        outcome
    }
}
