//! # Localization Tests
//!
//! Message lookup, argument substitution and language fallback across the
//! bundled English and Russian resources.

use cinema_bots::localization::{Localizer, DEFAULT_LANGUAGE};

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> Localizer {
        Localizer::new().expect("Failed to create localizer")
    }

    #[test]
    fn test_message_in_both_languages() {
        let l10n = setup_localization();

        assert_eq!(l10n.t("menu-add-movie", Some("en")), "➕ Add a movie");
        assert_eq!(l10n.t("menu-add-movie", Some("ru")), "➕ Добавить фильм");
    }

    #[test]
    fn test_regional_and_unknown_languages() {
        let l10n = setup_localization();

        assert_eq!(l10n.resolve_language(Some("ru-RU")), "ru");
        assert_eq!(l10n.resolve_language(Some("EN_gb")), "en");
        assert_eq!(l10n.resolve_language(Some("de")), DEFAULT_LANGUAGE);
        assert_eq!(l10n.resolve_language(None), DEFAULT_LANGUAGE);
        assert_eq!(l10n.t("menu-back", Some("de")), "<< Back");
    }

    #[test]
    fn test_arguments_without_isolation_marks() {
        let l10n = setup_localization();

        let message = l10n.t_args("lookup-not-found", &[("id", "042")], Some("en"));
        assert_eq!(message, "❌ Movie with ID 042 was not found.");
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_missing_key_falls_back_to_key() {
        let l10n = setup_localization();

        assert_eq!(l10n.t("no-such-message", Some("en")), "no-such-message");
    }

    #[test]
    fn test_button_labels_match_in_any_language() {
        let l10n = setup_localization();

        assert!(l10n.matches_any("menu-delete-movie", "🗑️ Delete a movie"));
        assert!(l10n.matches_any("menu-delete-movie", "🗑️ Удалить фильм"));
        assert!(!l10n.matches_any("menu-delete-movie", "Delete"));
    }

    #[test]
    fn test_every_english_key_has_russian_translation() {
        let l10n = setup_localization();
        let keys = [
            "menu-back",
            "menu-skip",
            "menu-find-movie",
            "menu-view-catalog",
            "menu-add-movie",
            "menu-delete-movie",
            "menu-add-admin",
            "unknown-command",
            "operation-cancelled",
            "error-processing-failed",
            "field-empty",
            "field-too-long",
            "lookup-welcome",
            "lookup-menu",
            "lookup-prompt",
            "lookup-text-expected",
            "lookup-photo-unavailable",
            "admin-no-access",
            "admin-welcome",
            "admin-menu",
            "catalog-empty",
            "catalog-header",
            "add-title-prompt",
            "add-year-prompt",
            "add-director-prompt",
            "add-genres-prompt",
            "add-genres-invalid",
            "add-photo-prompt",
            "add-photo-invalid",
            "add-photo-expected",
            "add-url-prompt",
            "movie-added",
            "delete-prompt",
            "admin-add-prompt",
            "admin-add-invalid",
        ];

        for key in keys {
            let en = l10n.t(key, Some("en"));
            let ru = l10n.t(key, Some("ru"));
            assert_ne!(en, key, "missing English message {key}");
            assert_ne!(ru, key, "missing Russian message {key}");
        }
    }
}
