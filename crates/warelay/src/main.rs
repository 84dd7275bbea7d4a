use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use warelay_core::{
    codec::RelayCodec,
    config::Config,
    logging::{self, component_span},
    ports::TelegramPort,
    relay::{InboundRelay, OutboundRelay},
};
use warelay_messenger::HttpMessenger;
use warelay_telegram::{bot_user_id, router::run_polling, TelegramSender};
use warelay_whatsapp::BridgeSource;

const EVENT_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(Config::load()?);
    logging::init("warelay", cfg.log_level, cfg.log_format)?;

    let (bot, me) = warelay_telegram::connect(&cfg.telegram_bot_token)
        .await
        .context("telegram login failed")?;

    // Relay sends are never retried.
    let telegram: Arc<dyn TelegramPort> = Arc::new(TelegramSender::new(bot.clone()));
    let codec = RelayCodec::new(cfg.relay.marker.clone());
    let cancel = CancellationToken::new();

    let mut outbound_tasks = Vec::new();
    if let Some(outbound) = cfg.relay.outbound() {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE);
        let source = BridgeSource::new(cfg.whatsapp_bridge_url.clone(), component_span("whatsapp"));
        outbound_tasks.push(
            source
                .start(tx, cancel.clone())
                .await
                .context("whatsapp bridge unavailable")?,
        );

        let relay = OutboundRelay::new(
            telegram.clone(),
            codec.clone(),
            outbound.group_chat_id,
            component_span("outbound"),
        );
        outbound_tasks.push(tokio::spawn(async move { relay.run(rx).await }));
        tracing::info!(chat_id = outbound.group_chat_id.0, "relaying WhatsApp messages to Telegram");
    }

    match cfg.relay.inbound() {
        Some(inbound) => {
            let messenger = Arc::new(HttpMessenger::new(
                &inbound.messenger,
                component_span("messenger"),
            )?);
            let relay = Arc::new(InboundRelay::new(
                telegram,
                messenger,
                codec,
                bot_user_id(&me),
                &inbound,
                component_span("inbound"),
            ));
            tracing::info!(
                group_title = inbound.group_title.as_deref().unwrap_or(""),
                "relaying agent replies to {}",
                inbound.messenger.url
            );
            run_polling(bot, relay).await;
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("waiting for shutdown signal")?;
        }
    }

    cancel.cancel();
    for task in outbound_tasks {
        let _ = task.await;
    }
    Ok(())
}
