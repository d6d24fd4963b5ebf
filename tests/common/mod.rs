#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cinema_bots::bot::{
    AdminConversation, Content, ConversationEngine, Incoming, Keyboard, LookupConversation,
    Messenger,
};
use cinema_bots::catalog::CatalogStore;
use cinema_bots::localization::Localizer;
use tempfile::TempDir;
use teloxide::types::ChatId;

pub const SEED_ADMIN: i64 = 111;

/// Something the bot tried to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat_id: ChatId,
        file_id: String,
        caption: String,
    },
}

/// Messenger double that records every call
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_photos: bool,
    pub reject_files: bool,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_text(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|s| match s {
                Sent::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.sent.lock().unwrap().iter().rev().find_map(|s| match s {
            Sent::Text { keyboard, .. } => keyboard.clone(),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: &str,
        _keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        if self.fail_photos {
            return Err(anyhow!("Bad Request: wrong file identifier"));
        }
        self.sent.lock().unwrap().push(Sent::Photo {
            chat_id,
            file_id: file_id.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn verify_photo(&self, file_id: &str) -> Result<()> {
        if self.reject_files {
            return Err(anyhow!("file {file_id} not found"));
        }
        Ok(())
    }
}

/// Both bots wired to a catalog in a temporary directory
pub struct Harness {
    pub dir: TempDir,
    pub store: Arc<CatalogStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub admin: ConversationEngine<AdminConversation>,
    pub lookup: ConversationEngine<LookupConversation>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_messenger(RecordingMessenger::default())
    }

    pub fn with_messenger(messenger: RecordingMessenger) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CatalogStore::new(dir.path().join("movies.json"), SEED_ADMIN));
        let l10n = Arc::new(Localizer::new().unwrap());
        let messenger = Arc::new(messenger);
        let as_dyn: Arc<dyn Messenger> = messenger.clone();

        let admin = ConversationEngine::with_in_memory_sessions(
            AdminConversation::new(store.clone(), l10n.clone(), as_dyn.clone()),
            as_dyn.clone(),
        );
        let lookup = ConversationEngine::with_in_memory_sessions(
            LookupConversation::new(store.clone(), l10n),
            as_dyn,
        );

        Self {
            dir,
            store,
            messenger,
            admin,
            lookup,
        }
    }

    pub fn catalog_exists(&self) -> bool {
        self.store.path().exists()
    }

    /// Send text to the admin bot as `user_id` (private chat)
    pub async fn admin_says(&self, user_id: i64, text: &str) {
        self.admin.process(text_from(user_id, text)).await.unwrap();
    }

    pub async fn lookup_says(&self, user_id: i64, text: &str) {
        self.lookup.process(text_from(user_id, text)).await.unwrap();
    }
}

pub fn text_from(user_id: i64, text: &str) -> Incoming {
    Incoming {
        chat_id: ChatId(user_id),
        user_id: Some(user_id),
        language_code: Some("en".to_string()),
        content: Content::Text(text.to_string()),
    }
}

pub fn photo_from(user_id: i64, file_id: &str) -> Incoming {
    Incoming {
        chat_id: ChatId(user_id),
        user_id: Some(user_id),
        language_code: Some("en".to_string()),
        content: Content::Photo(file_id.to_string()),
    }
}
