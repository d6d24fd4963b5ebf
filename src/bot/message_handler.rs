//! Message Handler module: turns Telegram updates into engine input

use teloxide::prelude::*;
use teloxide::types::UpdateKind;

/// Payload of an inbound message that dialog steps understand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Telegram file id of the largest photo size
    Photo(String),
    Other,
}

/// An inbound message, stripped down to what the conversation engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub chat_id: ChatId,
    /// Sender's Telegram user id, when the message has a sender
    pub user_id: Option<i64>,
    pub language_code: Option<String>,
    pub content: Content,
}

impl Incoming {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn lang(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    /// Extract the message of an update; other update kinds are not handled.
    pub fn from_update(update: &Update) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(msg) => Some(Self::from_message(msg)),
            _ => None,
        }
    }

    pub fn from_message(msg: &Message) -> Self {
        let content = if let Some(text) = msg.text() {
            Content::Text(text.to_string())
        } else if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
            Content::Photo(largest_photo.file.id.0.clone())
        } else {
            Content::Other
        };

        Self {
            chat_id: msg.chat.id,
            user_id: msg.from.as_ref().map(|user| user.id.0 as i64),
            language_code: msg.from.as_ref().and_then(|user| user.language_code.clone()),
            content,
        }
    }
}
