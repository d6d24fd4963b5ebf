//! Admin bot: catalog view, add-movie, delete-movie and add-admin flows.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::utils::html;
use tracing::{error, info, warn};

use crate::catalog::{AdminAddition, CatalogStore, MovieDraft};
use crate::dialogue::{
    current_year, parse_admin_id, parse_genres, parse_year, validate_text_field, AddMovieStep,
    AdminDialogueState,
};
use crate::localization::Localizer;

use super::dialogue_manager::{
    is_cancel_trigger, is_skip_trigger, Conversation, StepOutcome, CANCEL_COMMAND, START_COMMAND,
};
use super::message_handler::{Content, Incoming};
use super::messenger::{Messenger, Reply};
use super::ui_builder::{
    admin_menu_keyboard, back_keyboard, format_catalog, format_movie_added, skip_keyboard,
};

type Outcome = StepOutcome<AdminDialogueState>;

pub struct AdminConversation {
    store: Arc<CatalogStore>,
    l10n: Arc<Localizer>,
    media: Arc<dyn Messenger>,
}

impl AdminConversation {
    /// `media` is used to confirm uploaded posters before they are stored
    pub fn new(store: Arc<CatalogStore>, l10n: Arc<Localizer>, media: Arc<dyn Messenger>) -> Self {
        Self { store, l10n, media }
    }

    fn menu_reply(&self, key: &str, lang: Option<&str>) -> Reply {
        Reply::with_keyboard(self.l10n.t(key, lang), admin_menu_keyboard(&self.l10n, lang))
    }

    fn prompt(&self, key: &str, lang: Option<&str>) -> Reply {
        Reply::with_keyboard(self.l10n.t(key, lang), back_keyboard(&self.l10n, lang))
    }

    fn skip_prompt(&self, key: &str, lang: Option<&str>) -> Reply {
        Reply::with_keyboard(self.l10n.t(key, lang), skip_keyboard(&self.l10n, lang))
    }

    /// Menu buttons start their flow from scratch, whatever state the chat is in
    async fn entry_point(&self, text: &str, lang: Option<&str>) -> Option<Outcome> {
        if self.l10n.matches_any("menu-view-catalog", text) {
            return Some(self.view_catalog(lang).await);
        }
        if self.l10n.matches_any("menu-add-movie", text) {
            return Some(Outcome::next(
                AdminDialogueState::AddMovie(AddMovieStep::Title),
                vec![self.prompt("add-title-prompt", lang)],
            ));
        }
        if self.l10n.matches_any("menu-delete-movie", text) {
            return Some(Outcome::next(
                AdminDialogueState::DeleteMovie,
                vec![self.prompt("delete-prompt", lang)],
            ));
        }
        if self.l10n.matches_any("menu-add-admin", text) {
            return Some(Outcome::next(
                AdminDialogueState::AddAdmin,
                vec![self.prompt("admin-add-prompt", lang)],
            ));
        }
        None
    }

    async fn view_catalog(&self, lang: Option<&str>) -> Outcome {
        let movies = self.store.list_movies().await;
        let reply = if movies.is_empty() {
            self.menu_reply("catalog-empty", lang)
        } else {
            Reply::with_keyboard(
                format_catalog(&self.l10n, &movies, lang),
                admin_menu_keyboard(&self.l10n, lang),
            )
        };
        Outcome::finish(vec![reply])
    }

    async fn add_movie_step(
        &self,
        step: AddMovieStep,
        incoming: &Incoming,
        lang: Option<&str>,
    ) -> Outcome {
        match step {
            // Only the poster step accepts something other than text
            AddMovieStep::Photo {
                title,
                year,
                director,
                genres,
            } => self.photo_step(title, year, director, genres, incoming, lang).await,
            step => match incoming.text() {
                Some(text) => self.text_step(step, text, incoming, lang).await,
                None => Outcome::stay(vec![self.prompt(step_prompt_key(&step), lang)]),
            },
        }
    }

    async fn text_step(
        &self,
        step: AddMovieStep,
        text: &str,
        incoming: &Incoming,
        lang: Option<&str>,
    ) -> Outcome {
        match step {
            AddMovieStep::Title => match validate_text_field(text) {
                Ok(title) => Outcome::next(
                    AdminDialogueState::AddMovie(AddMovieStep::Year { title }),
                    vec![self.prompt("add-year-prompt", lang)],
                ),
                Err(e) => Outcome::stay(vec![Reply::text(self.l10n.t(e.message_key(), lang))]),
            },
            AddMovieStep::Year { title } => {
                let max_year = current_year();
                match parse_year(text, max_year) {
                    Some(year) => Outcome::next(
                        AdminDialogueState::AddMovie(AddMovieStep::Director { title, year }),
                        vec![self.prompt("add-director-prompt", lang)],
                    ),
                    None => Outcome::stay(vec![Reply::text(self.l10n.t_args(
                        "add-year-invalid",
                        &[("max", max_year.to_string().as_str())],
                        lang,
                    ))]),
                }
            }
            AddMovieStep::Director { title, year } => match validate_text_field(text) {
                Ok(director) => Outcome::next(
                    AdminDialogueState::AddMovie(AddMovieStep::Genres { title, year, director }),
                    vec![self.prompt("add-genres-prompt", lang)],
                ),
                Err(e) => Outcome::stay(vec![Reply::text(self.l10n.t(e.message_key(), lang))]),
            },
            AddMovieStep::Genres { title, year, director } => match parse_genres(text) {
                Some(genres) => Outcome::next(
                    AdminDialogueState::AddMovie(AddMovieStep::Photo {
                        title,
                        year,
                        director,
                        genres,
                    }),
                    vec![self.skip_prompt("add-photo-prompt", lang)],
                ),
                None => Outcome::stay(vec![Reply::text(self.l10n.t("add-genres-invalid", lang))]),
            },
            AddMovieStep::WatchUrl {
                title,
                year,
                director,
                genres,
                photo_url,
            } => {
                let watch_url = if is_skip_trigger(&self.l10n, text) {
                    None
                } else {
                    match validate_text_field(text) {
                        Ok(url) => Some(url),
                        Err(e) => {
                            let reply = Reply::text(self.l10n.t(e.message_key(), lang));
                            return Outcome::stay(vec![reply]);
                        }
                    }
                };

                let draft = MovieDraft {
                    title,
                    year,
                    director,
                    genres,
                    photo_url,
                    watch_url,
                };
                self.save_movie(draft, incoming, lang).await
            }
            AddMovieStep::Photo { .. } => {
                Outcome::stay(vec![self.skip_prompt("add-photo-prompt", lang)])
            }
        }
    }

    async fn photo_step(
        &self,
        title: String,
        year: i32,
        director: String,
        genres: Vec<String>,
        incoming: &Incoming,
        lang: Option<&str>,
    ) -> Outcome {
        let photo_url = match &incoming.content {
            Content::Photo(file_id) => {
                if let Err(e) = self.media.verify_photo(file_id).await {
                    error!(
                        user_id = %incoming.chat_id,
                        error = %e,
                        "Failed to verify uploaded photo"
                    );
                    return Outcome::stay(vec![Reply::text(self.l10n.t("add-photo-invalid", lang))]);
                }
                Some(file_id.clone())
            }
            Content::Text(text) if is_skip_trigger(&self.l10n, text) => None,
            _ => return Outcome::stay(vec![Reply::text(self.l10n.t("add-photo-expected", lang))]),
        };

        Outcome::next(
            AdminDialogueState::AddMovie(AddMovieStep::WatchUrl {
                title,
                year,
                director,
                genres,
                photo_url,
            }),
            vec![self.skip_prompt("add-url-prompt", lang)],
        )
    }

    async fn save_movie(
        &self,
        draft: MovieDraft,
        incoming: &Incoming,
        lang: Option<&str>,
    ) -> Outcome {
        let today = chrono::Local::now().date_naive();
        match self.store.add_movie(draft, today).await {
            Ok(movie) => {
                info!(
                    user_id = %incoming.chat_id,
                    movie_id = %movie.id,
                    "Movie added by administrator"
                );
                Outcome::finish(vec![Reply::with_keyboard(
                    format_movie_added(&self.l10n, &movie, lang),
                    admin_menu_keyboard(&self.l10n, lang),
                )])
            }
            Err(e) => {
                error!(user_id = %incoming.chat_id, error = %e, "Failed to save new movie");
                Outcome::finish(vec![self.menu_reply("error-processing-failed", lang)])
            }
        }
    }

    async fn delete_step(&self, incoming: &Incoming, lang: Option<&str>) -> Outcome {
        let Some(text) = incoming.text() else {
            return Outcome::stay(vec![self.prompt("delete-prompt", lang)]);
        };
        let movie_id = text.trim();

        let key = match self.store.delete_movie(movie_id).await {
            Ok(true) => "delete-success",
            Ok(false) => "delete-not-found",
            Err(e) => {
                error!(
                    user_id = %incoming.chat_id,
                    movie_id = %movie_id,
                    error = %e,
                    "Failed to delete movie"
                );
                return Outcome::finish(vec![self.menu_reply("error-processing-failed", lang)]);
            }
        };

        let shown_id = html::escape(movie_id);
        Outcome::finish(vec![Reply::with_keyboard(
            self.l10n.t_args(key, &[("id", shown_id.as_str())], lang),
            admin_menu_keyboard(&self.l10n, lang),
        )])
    }

    async fn add_admin_step(&self, incoming: &Incoming, lang: Option<&str>) -> Outcome {
        let Some(text) = incoming.text() else {
            return Outcome::stay(vec![self.prompt("admin-add-prompt", lang)]);
        };
        let Some(admin_id) = parse_admin_id(text) else {
            return Outcome::stay(vec![self.prompt("admin-add-invalid", lang)]);
        };

        let key = match self.store.add_administrator(admin_id).await {
            Ok(AdminAddition::Added) => {
                info!(user_id = %incoming.chat_id, admin_id, "Administrator granted access");
                "admin-add-success"
            }
            Ok(AdminAddition::AlreadyPresent) => "admin-add-exists",
            Err(e) => {
                error!(
                    user_id = %incoming.chat_id,
                    admin_id,
                    error = %e,
                    "Failed to add administrator"
                );
                return Outcome::finish(vec![self.menu_reply("error-processing-failed", lang)]);
            }
        };

        let id = admin_id.to_string();
        Outcome::finish(vec![Reply::with_keyboard(
            self.l10n.t_args(key, &[("id", id.as_str())], lang),
            admin_menu_keyboard(&self.l10n, lang),
        )])
    }
}

fn step_prompt_key(step: &AddMovieStep) -> &'static str {
    match step {
        AddMovieStep::Title => "add-title-prompt",
        AddMovieStep::Year { .. } => "add-year-prompt",
        AddMovieStep::Director { .. } => "add-director-prompt",
        AddMovieStep::Genres { .. } => "add-genres-prompt",
        AddMovieStep::Photo { .. } => "add-photo-prompt",
        AddMovieStep::WatchUrl { .. } => "add-url-prompt",
    }
}

#[async_trait]
impl Conversation for AdminConversation {
    type State = AdminDialogueState;

    fn name(&self) -> &'static str {
        "adminbot"
    }

    async fn handle(&self, state: AdminDialogueState, incoming: &Incoming) -> Result<Outcome> {
        let lang = incoming.lang();

        // Checked against the stored allow-list on every message so revocation is immediate
        let authorized = match incoming.user_id {
            Some(user_id) => self.store.is_administrator(user_id).await,
            None => false,
        };
        if !authorized {
            warn!(user_id = %incoming.chat_id, "Rejected message from non-administrator");
            return Ok(Outcome::finish(vec![Reply::text(self.l10n.t("admin-no-access", lang))]));
        }

        if let Some(text) = incoming.text() {
            let text = text.trim();
            if text.eq_ignore_ascii_case(START_COMMAND) {
                return Ok(Outcome::finish(vec![self.menu_reply("admin-welcome", lang)]));
            }
            if is_cancel_trigger(&self.l10n, text) {
                let key = if text.eq_ignore_ascii_case(CANCEL_COMMAND) {
                    "operation-cancelled"
                } else {
                    "admin-menu"
                };
                return Ok(Outcome::finish(vec![self.menu_reply(key, lang)]));
            }
            if let Some(outcome) = self.entry_point(text, lang).await {
                return Ok(outcome);
            }
        }

        let outcome = match state {
            AdminDialogueState::Menu => {
                warn!(user_id = %incoming.chat_id, "Unknown admin command");
                Outcome::stay(vec![self.menu_reply("unknown-command", lang)])
            }
            AdminDialogueState::AddMovie(step) => self.add_movie_step(step, incoming, lang).await,
            AdminDialogueState::DeleteMovie => self.delete_step(incoming, lang).await,
            AdminDialogueState::AddAdmin => self.add_admin_step(incoming, lang).await,
        };
        Ok(outcome)
    }
}
