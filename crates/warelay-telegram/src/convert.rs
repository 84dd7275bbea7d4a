//! teloxide types → core domain.

use teloxide::types::{Chat, Message, User};

use warelay_core::domain::{
    Author, ChatId, ChatKind, IncomingMessage, MessageId, RepliedMessage, UserId,
};

pub fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_group() {
        ChatKind::Group
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Private
    }
}

fn author(user: &User) -> Author {
    Author {
        id: UserId(user.id.0),
        is_bot: user.is_bot,
    }
}

pub fn incoming_message(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        chat_kind: chat_kind(&msg.chat),
        chat_title: msg.chat.title().map(str::to_string),
        text: msg.text().map(str::to_string),
        reply_to: msg.reply_to_message().map(|r| RepliedMessage {
            message_id: MessageId(r.id.0),
            author: r.from().map(author),
            text: r.text().map(str::to_string),
        }),
    }
}
