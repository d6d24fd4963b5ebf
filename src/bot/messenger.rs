//! Outbound side of a bot: reply values produced by dialog steps and the
//! platform client that delivers them.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, KeyboardButton, KeyboardMarkup, ParseMode};
use tracing::{debug, warn};

/// Reply keyboard as rows of button labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    pub fn single_column<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: labels.into_iter().map(|label| vec![label.into()]).collect(),
        }
    }

    fn to_markup(&self) -> KeyboardMarkup {
        let rows = self.rows.iter().map(|row| {
            row.iter()
                .map(|label| KeyboardButton::new(label.clone()))
                .collect::<Vec<_>>()
        });
        KeyboardMarkup::new(rows).resize_keyboard().one_time_keyboard()
    }
}

/// One message a dialog step wants sent back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// HTML-formatted text message
    Text {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Photo with an HTML caption; `fallback` is sent as text if the photo cannot be delivered
    Photo {
        file_id: String,
        caption: String,
        fallback: String,
        keyboard: Option<Keyboard>,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Text {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Platform client used by the conversation engine
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    /// Confirms that the platform knows `file_id`
    async fn verify_photo(&self, file_id: &str) -> Result<()>;
}

/// Send `replies` in order. A failed photo degrades to its text fallback.
pub async fn deliver(messenger: &dyn Messenger, chat_id: ChatId, replies: &[Reply]) -> Result<()> {
    for reply in replies {
        match reply {
            Reply::Text { text, keyboard } => {
                messenger.send_text(chat_id, text, keyboard.as_ref()).await?;
            }
            Reply::Photo {
                file_id,
                caption,
                fallback,
                keyboard,
            } => {
                if let Err(e) = messenger
                    .send_photo(chat_id, file_id, caption, keyboard.as_ref())
                    .await
                {
                    warn!(
                        user_id = %chat_id,
                        error = %e,
                        "Failed to send photo, falling back to text"
                    );
                    messenger.send_text(chat_id, fallback, keyboard.as_ref()).await?;
                }
            }
        }
    }
    debug!(user_id = %chat_id, replies = replies.len(), "Replies delivered");
    Ok(())
}

#[async_trait]
impl Messenger for Bot {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let request = self.send_message(chat_id, text).parse_mode(ParseMode::Html);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard.to_markup()).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let photo = InputFile::file_id(FileId(file_id.to_string()));
        let request = Requester::send_photo(self, chat_id, photo)
            .caption(caption)
            .parse_mode(ParseMode::Html);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard.to_markup()).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn verify_photo(&self, file_id: &str) -> Result<()> {
        self.get_file(FileId(file_id.to_string())).await?;
        Ok(())
    }
}
