//! UI Builder module for creating keyboards and formatting messages

use teloxide::utils::html;

use crate::catalog::Movie;
use crate::localization::Localizer;

use super::messenger::Keyboard;

/// Home menu of the admin bot
pub fn admin_menu_keyboard(l10n: &Localizer, language_code: Option<&str>) -> Keyboard {
    Keyboard::single_column([
        l10n.t("menu-view-catalog", language_code),
        l10n.t("menu-add-movie", language_code),
        l10n.t("menu-delete-movie", language_code),
        l10n.t("menu-add-admin", language_code),
        l10n.t("menu-back", language_code),
    ])
}

/// Home menu of the lookup bot
pub fn lookup_menu_keyboard(l10n: &Localizer, language_code: Option<&str>) -> Keyboard {
    Keyboard::single_column([
        l10n.t("menu-find-movie", language_code),
        l10n.t("menu-back", language_code),
    ])
}

/// Keyboard shown while a flow waits for input
pub fn back_keyboard(l10n: &Localizer, language_code: Option<&str>) -> Keyboard {
    Keyboard::single_column([l10n.t("menu-back", language_code)])
}

/// Keyboard for optional steps
pub fn skip_keyboard(l10n: &Localizer, language_code: Option<&str>) -> Keyboard {
    Keyboard::single_column([
        l10n.t("menu-skip", language_code),
        l10n.t("menu-back", language_code),
    ])
}

/// HTML movie card: title, year, director, genres and watch link
pub fn format_movie_card(l10n: &Localizer, movie: &Movie, language_code: Option<&str>) -> String {
    let year = movie.year.to_string();
    let title = html::escape(&movie.title);
    let director = html::escape(&movie.director);
    let genres = html::escape(&movie.genres_joined());

    let mut card = l10n.t_args(
        "movie-card",
        &[
            ("title", title.as_str()),
            ("year", year.as_str()),
            ("director", director.as_str()),
            ("genres", genres.as_str()),
        ],
        language_code,
    );

    if let Some(url) = movie.watch_link() {
        let url = html::escape(url).replace('"', "&quot;");
        card.push('\n');
        card.push_str(&l10n.t_args("movie-watch-link", &[("url", url.as_str())], language_code));
    }

    card
}

/// Confirmation shown after a movie is stored
pub fn format_movie_added(l10n: &Localizer, movie: &Movie, language_code: Option<&str>) -> String {
    format!(
        "{}\n\n{}\n{}",
        l10n.t("movie-added", language_code),
        l10n.t_args(
            "movie-added-ids",
            &[("id", movie.id.as_str()), ("code", movie.code.as_str())],
            language_code
        ),
        format_movie_card(l10n, movie, language_code)
    )
}

/// One line per movie for the admin catalog view
pub fn format_catalog(l10n: &Localizer, movies: &[Movie], language_code: Option<&str>) -> String {
    let mut result = format!("{}\n\n", l10n.t("catalog-header", language_code));

    for movie in movies {
        let year = movie.year.to_string();
        let id = html::escape(&movie.id);
        let code = html::escape(&movie.code);
        let title = html::escape(&movie.title);
        let director = html::escape(&movie.director);
        let genres = html::escape(&movie.genres_joined());
        result.push_str(&l10n.t_args(
            "catalog-line",
            &[
                ("id", id.as_str()),
                ("code", code.as_str()),
                ("title", title.as_str()),
                ("year", year.as_str()),
                ("director", director.as_str()),
                ("genres", genres.as_str()),
            ],
            language_code,
        ));
        result.push('\n');
    }

    result
}
