//! Telegram adapter (teloxide).
//!
//! Implements the `warelay-core` TelegramPort over the Bot API and feeds
//! message updates into the inbound relay.

use async_trait::async_trait;

use teloxide::{prelude::*, types::Me};

pub mod convert;
pub mod router;

use warelay_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    ports::TelegramPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

/// Authenticate the token and learn who we are. An invalid token is fatal.
pub async fn connect(token: &str) -> Result<(Bot, Me)> {
    let bot = Bot::new(token);
    let me = bot.get_me().await.map_err(TelegramSender::map_err)?;
    tracing::info!("Authorized on Telegram account [{}]", me.username());
    Ok((bot, me))
}

pub fn bot_user_id(me: &Me) -> UserId {
    UserId(me.id.0)
}

#[async_trait]
impl TelegramPort for TelegramSender {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let mut req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
        if let Some(id) = reply_to {
            req = req.reply_to_message_id(Self::tg_msg_id(id));
        }
        let msg = req.await.map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
