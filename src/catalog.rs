//! # Catalog Store Module
//!
//! The catalog is a single JSON document holding every movie record and the
//! administrator allow-list. Both bots share one [`CatalogStore`]; every
//! read-modify-write cycle runs under the store's write lock so the two bots
//! never overwrite each other's changes.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Length of the shareable movie code
pub const MOVIE_CODE_LENGTH: usize = 6;
const MOVIE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to encode catalog document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write catalog document {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A movie record as stored in the catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    #[serde(default)]
    pub code: String,
    pub title: String,
    pub year: i32,
    pub director: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub watch_url: Option<String>,
    pub added_date: NaiveDate,
    #[serde(default)]
    pub ratings: Vec<serde_json::Value>,
    #[serde(default)]
    pub reviews: Vec<serde_json::Value>,
}

impl Movie {
    /// Stored photo file id, treating the legacy empty string as absent
    pub fn photo(&self) -> Option<&str> {
        self.photo_url.as_deref().filter(|p| !p.is_empty())
    }

    pub fn watch_link(&self) -> Option<&str> {
        self.watch_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn genres_joined(&self) -> String {
        self.genre.join(", ")
    }
}

/// Fields collected by the add-movie dialog, before id and code are assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDraft {
    pub title: String,
    pub year: i32,
    pub director: String,
    pub genres: Vec<String>,
    pub photo_url: Option<String>,
    pub watch_url: Option<String>,
}

/// The whole persisted document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub movies: Vec<Movie>,
    pub admins: Vec<i64>,
}

impl Catalog {
    /// Fresh document with only the seed administrator
    pub fn seeded(seed_admin_id: i64) -> Self {
        Self {
            movies: Vec::new(),
            admins: vec![seed_admin_id],
        }
    }

    pub fn find_movie(&self, movie_id: &str) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == movie_id)
    }

    pub fn is_administrator(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }
}

/// Document shape on disk; either top-level list may be missing.
#[derive(Debug, Deserialize)]
struct StoredCatalog {
    movies: Option<Vec<Movie>>,
    admins: Option<Vec<i64>>,
}

/// Outcome of [`CatalogStore::add_administrator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAddition {
    Added,
    AlreadyPresent,
}

/// Next sequential id: catalog size plus one, zero-padded to three digits.
///
/// Deletions can make that number collide with a surviving record; in that
/// case the next free number is used instead.
pub fn next_movie_id(movies: &[Movie]) -> String {
    let mut candidate = movies.len() + 1;
    loop {
        let id = format!("{candidate:03}");
        if !movies.iter().any(|m| m.id == id) {
            return id;
        }
        candidate += 1;
    }
}

/// Random uppercase alphanumeric code of [`MOVIE_CODE_LENGTH`] characters
pub fn generate_movie_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..MOVIE_CODE_LENGTH)
        .map(|_| MOVIE_CODE_CHARSET[rng.gen_range(0..MOVIE_CODE_CHARSET.len())] as char)
        .collect()
}

/// Code not yet used by any movie in the catalog
pub fn unique_movie_code(movies: &[Movie]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code = generate_movie_code(&mut rng);
        if !movies.iter().any(|m| m.code == code) {
            return code;
        }
        debug!(code = %code, "Generated movie code already taken, retrying");
    }
}

/// Serialized-access store for the catalog document
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    seed_admin_id: i64,
    write_lock: Mutex<()>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>, seed_admin_id: i64) -> Self {
        Self {
            path: path.into(),
            seed_admin_id,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document from disk.
    ///
    /// A missing or unreadable document yields a fresh seeded catalog; this
    /// never fails.
    pub async fn load(&self) -> Catalog {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    path = %self.path.display(),
                    "Catalog document not found, starting a new one"
                );
                return Catalog::seeded(self.seed_admin_id);
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read catalog document");
                return Catalog::seeded(self.seed_admin_id);
            }
        };

        match serde_json::from_slice::<StoredCatalog>(&bytes) {
            Ok(stored) => Catalog {
                movies: stored.movies.unwrap_or_default(),
                admins: stored.admins.unwrap_or_else(|| vec![self.seed_admin_id]),
            },
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "Catalog document is corrupt or empty, starting a new one"
                );
                Catalog::seeded(self.seed_admin_id)
            }
        }
    }

    /// Replace the document on disk with `catalog`.
    pub async fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let json = serde_json::to_vec_pretty(catalog)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| CatalogError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).await.map_err(|source| CatalogError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|source| CatalogError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            path = %self.path.display(),
            movies = catalog.movies.len(),
            admins = catalog.admins.len(),
            "Catalog document saved"
        );
        Ok(())
    }

    /// Fresh membership check against the persisted allow-list
    pub async fn is_administrator(&self, user_id: i64) -> bool {
        self.load().await.is_administrator(user_id)
    }

    pub async fn find_movie(&self, movie_id: &str) -> Option<Movie> {
        self.load().await.find_movie(movie_id).cloned()
    }

    pub async fn list_movies(&self) -> Vec<Movie> {
        self.load().await.movies
    }

    /// Assign id and code to `draft`, append it and persist.
    pub async fn add_movie(
        &self,
        draft: MovieDraft,
        added_date: NaiveDate,
    ) -> Result<Movie, CatalogError> {
        let _guard = self.write_lock.lock().await;
        let mut catalog = self.load().await;

        let movie = Movie {
            id: next_movie_id(&catalog.movies),
            code: unique_movie_code(&catalog.movies),
            title: draft.title,
            year: draft.year,
            director: draft.director,
            genre: draft.genres,
            photo_url: draft.photo_url,
            watch_url: draft.watch_url,
            added_date,
            ratings: Vec::new(),
            reviews: Vec::new(),
        };
        catalog.movies.push(movie.clone());
        self.save(&catalog).await?;

        info!(
            movie_id = %movie.id,
            code = %movie.code,
            title = %movie.title,
            "Movie added to catalog"
        );
        Ok(movie)
    }

    /// Remove the first movie with `movie_id`. Returns `false` and leaves the
    /// document untouched when no such movie exists.
    pub async fn delete_movie(&self, movie_id: &str) -> Result<bool, CatalogError> {
        let _guard = self.write_lock.lock().await;
        let mut catalog = self.load().await;

        let Some(index) = catalog.movies.iter().position(|m| m.id == movie_id) else {
            warn!(movie_id = %movie_id, "Delete requested for unknown movie");
            return Ok(false);
        };
        catalog.movies.remove(index);
        self.save(&catalog).await?;

        info!(movie_id = %movie_id, "Movie deleted from catalog");
        Ok(true)
    }

    pub async fn add_administrator(&self, user_id: i64) -> Result<AdminAddition, CatalogError> {
        let _guard = self.write_lock.lock().await;
        let mut catalog = self.load().await;

        if catalog.is_administrator(user_id) {
            return Ok(AdminAddition::AlreadyPresent);
        }
        catalog.admins.push(user_id);
        self.save(&catalog).await?;

        info!(admin_id = user_id, "Administrator added");
        Ok(AdminAddition::Added)
    }
}
