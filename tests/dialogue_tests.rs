mod common;

use std::sync::Arc;

use anyhow::Result;
use cinema_bots::bot::{AdminConversation, ConversationEngine, Messenger};
use cinema_bots::catalog::CatalogStore;
use cinema_bots::dialogue::{validate_text_field, AddMovieStep, AdminDialogueState, FieldError};
use cinema_bots::localization::Localizer;
use common::{text_from, Harness, RecordingMessenger, SEED_ADMIN};
use teloxide::dispatching::dialogue::{InMemStorage, Storage};
use teloxide::types::ChatId;

/// Field validation used by every free-text step
#[tokio::test]
async fn test_movie_field_validation() -> Result<()> {
    assert_eq!(validate_text_field("  Blade Runner  ").unwrap(), "Blade Runner");
    assert_eq!(validate_text_field(""), Err(FieldError::Empty));
    assert_eq!(validate_text_field(&"я".repeat(255)).unwrap().chars().count(), 255);
    assert_eq!(validate_text_field(&"я".repeat(256)), Err(FieldError::TooLong));
    Ok(())
}

/// Sessions live in the injected store, so an engine rebuilt on the same
/// store resumes the flow where it stopped
#[tokio::test]
async fn test_engine_resumes_from_shared_session_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(CatalogStore::new(dir.path().join("movies.json"), SEED_ADMIN));
    let l10n = Arc::new(Localizer::new()?);
    let messenger: Arc<dyn Messenger> = Arc::new(RecordingMessenger::default());
    let sessions = InMemStorage::<AdminDialogueState>::new().erase();

    let build = || {
        ConversationEngine::new(
            AdminConversation::new(store.clone(), l10n.clone(), messenger.clone()),
            sessions.clone(),
            messenger.clone(),
        )
    };

    let first = build();
    first.process(text_from(SEED_ADMIN, "➕ Add a movie")).await?;
    first.process(text_from(SEED_ADMIN, "Stalker")).await?;
    drop(first);

    let second = build();
    assert_eq!(
        second.session(ChatId(SEED_ADMIN)).await?,
        Some(AdminDialogueState::AddMovie(AddMovieStep::Year {
            title: "Stalker".to_string()
        }))
    );

    second.process(text_from(SEED_ADMIN, "1979")).await?;
    assert!(matches!(
        second.session(ChatId(SEED_ADMIN)).await?,
        Some(AdminDialogueState::AddMovie(AddMovieStep::Director { year: 1979, .. }))
    ));
    Ok(())
}

/// Messages from one chat arriving together are applied in order, each on
/// top of the state the previous one left
#[tokio::test]
async fn test_same_chat_messages_are_handled_in_turn() -> Result<()> {
    let h = Harness::new();
    h.admin_says(SEED_ADMIN, "➕ Add a movie").await;

    let (title, year) = tokio::join!(
        h.admin.process(text_from(SEED_ADMIN, "Stalker")),
        h.admin.process(text_from(SEED_ADMIN, "1979")),
    );
    title?;
    year?;

    assert_eq!(
        h.admin.session(ChatId(SEED_ADMIN)).await?,
        Some(AdminDialogueState::AddMovie(AddMovieStep::Director {
            title: "Stalker".to_string(),
            year: 1979
        }))
    );
    Ok(())
}

/// Different chats do not wait on each other's turn
#[tokio::test]
async fn test_other_chats_proceed_independently() -> Result<()> {
    let h = Harness::new();
    h.store.add_administrator(222).await?;

    let (first, second) = tokio::join!(
        h.admin.process(text_from(SEED_ADMIN, "➕ Add a movie")),
        h.admin.process(text_from(222, "🗑️ Delete a movie")),
    );
    first?;
    second?;

    assert_eq!(
        h.admin.session(ChatId(SEED_ADMIN)).await?,
        Some(AdminDialogueState::AddMovie(AddMovieStep::Title))
    );
    assert_eq!(h.admin.session(ChatId(222)).await?, Some(AdminDialogueState::DeleteMovie));
    Ok(())
}

/// Session states survive a JSON round trip, as a persistent store would need
#[tokio::test]
async fn test_admin_state_serialization() -> Result<()> {
    let state = AdminDialogueState::AddMovie(AddMovieStep::WatchUrl {
        title: "Stalker".to_string(),
        year: 1979,
        director: "Andrei Tarkovsky".to_string(),
        genres: vec!["sci-fi".to_string(), "drama".to_string()],
        photo_url: Some("AgACAgIAAxkBAAIB".to_string()),
    });

    let json = serde_json::to_string(&state)?;
    let restored: AdminDialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);
    Ok(())
}
