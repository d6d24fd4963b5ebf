//! Dialogue state for both bots and validation of the values each step collects.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

pub const MIN_YEAR: i32 = 1800;
pub const MAX_FIELD_LEN: usize = 255;

/// Steps of the add-movie flow; each step carries only what is collected so far
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddMovieStep {
    Title,
    Year {
        title: String,
    },
    Director {
        title: String,
        year: i32,
    },
    Genres {
        title: String,
        year: i32,
        director: String,
    },
    Photo {
        title: String,
        year: i32,
        director: String,
        genres: Vec<String>,
    },
    WatchUrl {
        title: String,
        year: i32,
        director: String,
        genres: Vec<String>,
        photo_url: Option<String>,
    },
}

/// Conversation state of the admin bot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminDialogueState {
    #[default]
    Menu,
    AddMovie(AddMovieStep),
    DeleteMovie,
    AddAdmin,
}

/// Conversation state of the lookup bot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupDialogueState {
    #[default]
    Menu,
    FindById,
}

/// Why a text field was rejected; the value is the Fluent message key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Empty,
    TooLong,
}

impl FieldError {
    pub fn message_key(self) -> &'static str {
        match self {
            FieldError::Empty => "field-empty",
            FieldError::TooLong => "field-too-long",
        }
    }
}

/// Validates a free-text field (title, director, link)
pub fn validate_text_field(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }

    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(FieldError::TooLong);
    }

    Ok(trimmed.to_string())
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Parses a release year in `[MIN_YEAR, max_year]`
pub fn parse_year(input: &str, max_year: i32) -> Option<i32> {
    input
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|year| (MIN_YEAR..=max_year).contains(year))
}

/// Splits a comma-separated genre list, dropping blank entries
pub fn parse_genres(input: &str) -> Option<Vec<String>> {
    let genres: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();

    if genres.is_empty() {
        None
    } else {
        Some(genres)
    }
}

/// Parses a numeric Telegram user id
pub fn parse_admin_id(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok()
}
