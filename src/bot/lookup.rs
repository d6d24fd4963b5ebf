//! Lookup bot: find a movie by its catalog id.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::utils::html;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::dialogue::LookupDialogueState;
use crate::localization::Localizer;

use super::dialogue_manager::{
    is_cancel_trigger, Conversation, StepOutcome, CANCEL_COMMAND, START_COMMAND,
};
use super::message_handler::Incoming;
use super::messenger::Reply;
use super::ui_builder::{back_keyboard, format_movie_card, lookup_menu_keyboard};

type Outcome = StepOutcome<LookupDialogueState>;

pub struct LookupConversation {
    store: Arc<CatalogStore>,
    l10n: Arc<Localizer>,
}

impl LookupConversation {
    pub fn new(store: Arc<CatalogStore>, l10n: Arc<Localizer>) -> Self {
        Self { store, l10n }
    }

    fn menu_reply(&self, key: &str, lang: Option<&str>) -> Reply {
        Reply::with_keyboard(self.l10n.t(key, lang), lookup_menu_keyboard(&self.l10n, lang))
    }

    async fn find_movie(&self, incoming: &Incoming, lang: Option<&str>) -> Outcome {
        let Some(text) = incoming.text() else {
            return Outcome::stay(vec![Reply::text(self.l10n.t("lookup-text-expected", lang))]);
        };
        let movie_id = text.trim();

        let Some(movie) = self.store.find_movie(movie_id).await else {
            info!(user_id = %incoming.chat_id, movie_id = %movie_id, "Movie not found");
            // Replies are HTML; the id is whatever the user typed
            let shown_id = html::escape(movie_id);
            return Outcome::finish(vec![Reply::with_keyboard(
                self.l10n.t_args("lookup-not-found", &[("id", shown_id.as_str())], lang),
                lookup_menu_keyboard(&self.l10n, lang),
            )]);
        };

        info!(user_id = %incoming.chat_id, movie_id = %movie.id, "Movie found");
        let card = format_movie_card(&self.l10n, &movie, lang);
        let keyboard = lookup_menu_keyboard(&self.l10n, lang);

        let reply = match movie.photo() {
            Some(file_id) => Reply::Photo {
                file_id: file_id.to_string(),
                fallback: format!("{}\n{}", self.l10n.t("lookup-photo-unavailable", lang), card),
                caption: card,
                keyboard: Some(keyboard),
            },
            None => Reply::with_keyboard(card, keyboard),
        };
        Outcome::finish(vec![reply])
    }
}

#[async_trait]
impl Conversation for LookupConversation {
    type State = LookupDialogueState;

    fn name(&self) -> &'static str {
        "cinemabot"
    }

    async fn handle(&self, state: LookupDialogueState, incoming: &Incoming) -> Result<Outcome> {
        let lang = incoming.lang();

        if let Some(text) = incoming.text() {
            let text = text.trim();
            if text.eq_ignore_ascii_case(START_COMMAND) {
                return Ok(Outcome::finish(vec![self.menu_reply("lookup-welcome", lang)]));
            }
            if is_cancel_trigger(&self.l10n, text) {
                let key = if text.eq_ignore_ascii_case(CANCEL_COMMAND) {
                    "operation-cancelled"
                } else {
                    "lookup-menu"
                };
                return Ok(Outcome::finish(vec![self.menu_reply(key, lang)]));
            }
            if self.l10n.matches_any("menu-find-movie", text) {
                return Ok(Outcome::next(
                    LookupDialogueState::FindById,
                    vec![Reply::with_keyboard(
                        self.l10n.t("lookup-prompt", lang),
                        back_keyboard(&self.l10n, lang),
                    )],
                ));
            }
        }

        let outcome = match state {
            LookupDialogueState::Menu => {
                warn!(user_id = %incoming.chat_id, "Unknown lookup command");
                Outcome::stay(vec![self.menu_reply("unknown-command", lang)])
            }
            LookupDialogueState::FindById => self.find_movie(incoming, lang).await,
        };
        Ok(outcome)
    }
}
