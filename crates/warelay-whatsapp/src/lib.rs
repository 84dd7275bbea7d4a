//! WhatsApp event source.
//!
//! The WhatsApp protocol itself runs in a bridge process (multi-device
//! client, QR pairing, device store). This crate speaks the bridge's JSON
//! WebSocket protocol and turns its frames into `WhatsAppEvent`s on a channel.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use futures::StreamExt;
use serde::Deserialize;
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Span};

use warelay_core::{
    domain::{ChatEvent, WhatsAppEvent},
    errors::Error,
    Result,
};

pub mod qr;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Frames received from the bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BridgeFrame {
    Message {
        #[serde(default)]
        id: String,
        #[serde(default)]
        sender: String,
        #[serde(default, rename = "pushName")]
        push_name: String,
        #[serde(default)]
        timestamp: Option<i64>,
        #[serde(default)]
        conversation: Option<String>,
        #[serde(default, rename = "extendedText")]
        extended_text: Option<String>,
    },
    Qr {
        qr: String,
    },
    Status {
        status: String,
    },
    Error {
        error: String,
    },
    #[serde(other)]
    Unknown,
}

pub struct BridgeSource {
    url: String,
    span: Span,
}

impl BridgeSource {
    pub fn new(url: impl Into<String>, span: Span) -> Self {
        Self {
            url: url.into(),
            span,
        }
    }

    /// Connect to the bridge and start pumping events into `tx`.
    ///
    /// Failing to reach the bridge here is a startup error. Once running, a
    /// dropped connection is re-established until `cancel` fires; the channel
    /// closes when the task ends.
    pub async fn start(
        self,
        tx: mpsc::Sender<WhatsAppEvent>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let stream = self.connect().await?;
        Ok(tokio::spawn(async move {
            self.run(stream, tx, cancel).await;
        }))
    }

    async fn connect(&self) -> Result<WsStream> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::External(format!("whatsapp bridge connect error: {e}")))?;
        self.span
            .in_scope(|| info!("connected to WhatsApp bridge at {}", self.url));
        Ok(stream)
    }

    async fn run(&self, first: WsStream, tx: mpsc::Sender<WhatsAppEvent>, cancel: CancellationToken) {
        let mut stream = Some(first);
        loop {
            let current = match stream.take() {
                Some(s) => s,
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                    match self.connect().await {
                        Ok(s) => s,
                        Err(e) => {
                            self.span.in_scope(|| error!("{e}"));
                            continue;
                        }
                    }
                }
            };

            let reason = self.pump(current, &tx, &cancel).await;
            if cancel.is_cancelled() || tx.is_closed() {
                break;
            }
            let _ = tx.send(WhatsAppEvent::Disconnected(reason)).await;
        }
        self.span.in_scope(|| info!("WhatsApp bridge source stopped"));
    }

    /// Read one connection until it ends. Returns why it ended.
    async fn pump(
        &self,
        mut stream: WsStream,
        tx: &mpsc::Sender<WhatsAppEvent>,
        cancel: &CancellationToken,
    ) -> String {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => return "shutdown".to_string(),
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let Some(event) = self.span.in_scope(|| parse_frame(&text)) else {
                        continue;
                    };
                    if let WhatsAppEvent::Qr(code) = &event {
                        self.show_pairing_code(code);
                    }
                    if tx.send(event).await.is_err() {
                        return "event receiver dropped".to_string();
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    return "bridge closed the connection".to_string();
                }
                Some(Err(e)) => {
                    return format!("bridge connection error: {e}");
                }
                Some(Ok(_)) => {}
            }
        }
    }

    /// Print the pairing code as a scannable QR code on stdout.
    fn show_pairing_code(&self, code: &str) {
        match qr::render_half_blocks(code) {
            Ok(art) => {
                println!("{art}");
                self.span.in_scope(|| {
                    info!("scan the QR code above with WhatsApp (Linked devices) to log in")
                });
            }
            Err(e) => self
                .span
                .in_scope(|| warn!("{e}; pair manually with code: {code}")),
        }
    }
}

/// Map one bridge frame to an event. Frames that carry nothing for the relay
/// return `None`.
fn parse_frame(raw: &str) -> Option<WhatsAppEvent> {
    let frame: BridgeFrame = match serde_json::from_str(raw) {
        Ok(f) => f,
        Err(e) => {
            warn!(
                "invalid JSON from bridge: {e} (raw: {})",
                raw.chars().take(100).collect::<String>()
            );
            return None;
        }
    };

    match frame {
        BridgeFrame::Message {
            id,
            sender,
            push_name,
            timestamp,
            conversation,
            extended_text,
        } => {
            // Some clients put the text only in the extended-text field.
            let body = conversation
                .filter(|s| !s.is_empty())
                .or(extended_text)
                .unwrap_or_default();
            if body.is_empty() {
                debug!(id = %id, "ignoring WhatsApp message without text");
                return None;
            }
            Some(WhatsAppEvent::Message(ChatEvent {
                id,
                sender_phone: phone_from_jid(&sender),
                sender_name: push_name,
                timestamp: to_timestamp(timestamp),
                body,
            }))
        }
        BridgeFrame::Qr { qr } => Some(WhatsAppEvent::Qr(qr)),
        BridgeFrame::Status { status } => match status.as_str() {
            "connected" | "open" => Some(WhatsAppEvent::Connected),
            "disconnected" | "close" | "logged_out" => Some(WhatsAppEvent::Disconnected(status)),
            other => {
                info!("Login event: {other}");
                None
            }
        },
        BridgeFrame::Error { error } => Some(WhatsAppEvent::Error(error)),
        BridgeFrame::Unknown => None,
    }
}

/// `62811:12@s.whatsapp.net` → `62811`.
fn phone_from_jid(jid: &str) -> String {
    let user = jid.split('@').next().unwrap_or(jid);
    user.split(':').next().unwrap_or(user).to_string()
}

fn to_timestamp(secs: Option<i64>) -> DateTime<FixedOffset> {
    secs.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .unwrap_or_else(Utc::now)
        .fixed_offset()
}
