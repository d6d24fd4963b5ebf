//! Dialogue Manager module: the step runner shared by both bots.
//!
//! A [`Conversation`] decides what a message means in the current state and
//! returns a [`StepOutcome`]. The [`ConversationEngine`] owns the session
//! store, applies the transition and delivers the replies. Messages from one
//! chat are handled one at a time, in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use teloxide::dispatching::dialogue::{Dialogue, ErasedStorage, InMemStorage, Storage};
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::localization::Localizer;

use super::message_handler::Incoming;
use super::messenger::{deliver, Messenger, Reply};

pub const CANCEL_COMMAND: &str = "/cancel";
pub const START_COMMAND: &str = "/start";
pub const SKIP_COMMAND: &str = "/skip";

/// What happens to the session after a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<S> {
    /// Keep the current state and everything collected so far
    Stay,
    /// Move to another state
    Next(S),
    /// Flow complete or abandoned; the session is discarded
    Finish,
}

/// Result of handling one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome<S> {
    pub replies: Vec<Reply>,
    pub transition: Transition<S>,
}

impl<S> StepOutcome<S> {
    pub fn stay(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            transition: Transition::Stay,
        }
    }

    pub fn next(state: S, replies: Vec<Reply>) -> Self {
        Self {
            replies,
            transition: Transition::Next(state),
        }
    }

    pub fn finish(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            transition: Transition::Finish,
        }
    }
}

/// A bot's dialog logic, independent of session storage and delivery
#[async_trait]
pub trait Conversation: Send + Sync {
    type State: Clone + Default + std::fmt::Debug + Send + Sync + 'static;

    /// Bot name used in logs
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        state: Self::State,
        incoming: &Incoming,
    ) -> Result<StepOutcome<Self::State>>;
}

/// True for the `/cancel` command and the "back" button in any language
pub fn is_cancel_trigger(l10n: &Localizer, text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case(CANCEL_COMMAND) || l10n.matches_any("menu-back", text)
}

/// True for the `/skip` command and the "skip" button in any language
pub fn is_skip_trigger(l10n: &Localizer, text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case(SKIP_COMMAND) || l10n.matches_any("menu-skip", text)
}

/// Runs a [`Conversation`] against a session store and a messenger
pub struct ConversationEngine<C: Conversation> {
    conversation: C,
    sessions: Arc<ErasedStorage<C::State>>,
    messenger: Arc<dyn Messenger>,
    /// One turn lock per chat with a message in flight
    chat_turns: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl<C: Conversation> ConversationEngine<C> {
    pub fn new(
        conversation: C,
        sessions: Arc<ErasedStorage<C::State>>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            conversation,
            sessions,
            messenger,
            chat_turns: Mutex::new(HashMap::new()),
        }
    }

    /// Engine with process-local sessions that are lost on restart
    pub fn with_in_memory_sessions(conversation: C, messenger: Arc<dyn Messenger>) -> Self {
        Self::new(conversation, InMemStorage::<C::State>::new().erase(), messenger)
    }

    pub fn name(&self) -> &'static str {
        self.conversation.name()
    }

    fn dialogue(&self, chat_id: ChatId) -> Dialogue<C::State, ErasedStorage<C::State>> {
        Dialogue::new(Arc::clone(&self.sessions), chat_id)
    }

    /// Current session state for a chat, `None` when no flow is in progress
    pub async fn session(&self, chat_id: ChatId) -> Result<Option<C::State>> {
        self.dialogue(chat_id)
            .get()
            .await
            .map_err(|e| anyhow!("session store error: {e}"))
    }

    /// Handle one inbound message to completion.
    ///
    /// A second message from the same chat waits until this one has been
    /// handled, so every step sees the state left by the previous one.
    pub async fn process(&self, incoming: Incoming) -> Result<()> {
        let chat_id = incoming.chat_id;
        let turn = {
            let mut turns = self.chat_turns.lock().await;
            Arc::clone(turns.entry(chat_id).or_default())
        };

        let result = {
            let _turn = turn.lock().await;
            self.process_turn(incoming).await
        };

        // Clones are only taken under the map lock, so a count of two means
        // nobody else is waiting on this chat
        let mut turns = self.chat_turns.lock().await;
        if Arc::strong_count(&turn) == 2 {
            turns.remove(&chat_id);
        }
        result
    }

    async fn process_turn(&self, incoming: Incoming) -> Result<()> {
        let chat_id = incoming.chat_id;
        let dialogue = self.dialogue(chat_id);

        let state = dialogue
            .get_or_default()
            .await
            .map_err(|e| anyhow!("session store error: {e}"))?;
        debug!(bot = self.name(), user_id = %chat_id, state = ?state, "Handling message");

        let outcome = self.conversation.handle(state, &incoming).await?;

        match outcome.transition {
            Transition::Stay => {}
            Transition::Next(next) => {
                debug!(bot = self.name(), user_id = %chat_id, state = ?next, "Dialogue advanced");
                dialogue
                    .update(next)
                    .await
                    .map_err(|e| anyhow!("session store error: {e}"))?;
            }
            Transition::Finish => {
                info!(bot = self.name(), user_id = %chat_id, "Dialogue finished");
                dialogue
                    .exit()
                    .await
                    .map_err(|e| anyhow!("session store error: {e}"))?;
            }
        }

        deliver(self.messenger.as_ref(), chat_id, &outcome.replies).await
    }
}
