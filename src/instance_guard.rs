//! # Instance Guard Module
//!
//! Marker files that keep a second copy of a bot from starting while one is
//! already running. The file holds the owner's process id and is removed when
//! the guard is dropped.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum GuardError {
    #[error(
        "{name} is already running. Remove {} if you are sure no other instance is running.",
        .path.display()
    )]
    AlreadyRunning { name: String, path: PathBuf },
    #[error("failed to create lock file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Held for the lifetime of one bot; dropping it removes the marker file
#[derive(Debug)]
pub struct InstanceGuard {
    path: PathBuf,
}

impl InstanceGuard {
    /// Create `<dir>/<name>.lock`, failing if it already exists
    pub fn acquire(dir: &Path, name: &str) -> Result<Self, GuardError> {
        let path = dir.join(format!("{name}.lock"));

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(GuardError::AlreadyRunning {
                    name: name.to_string(),
                    path,
                });
            }
            Err(source) => return Err(GuardError::Io { path, source }),
        };

        if let Err(source) = write!(file, "{}", std::process::id()) {
            let _ = std::fs::remove_file(&path);
            return Err(GuardError::Io { path, source });
        }

        info!(lock_file = %path.display(), "Instance guard acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!(lock_file = %self.path.display(), "Instance guard released"),
            Err(e) => error!(
                lock_file = %self.path.display(),
                error = %e,
                "Failed to remove lock file"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();

        let guard = InstanceGuard::acquire(dir.path(), "adminbot").unwrap();
        let contents = std::fs::read_to_string(guard.path()).unwrap();
        assert_eq!(contents, std::process::id().to_string());

        let err = InstanceGuard::acquire(dir.path(), "adminbot").unwrap_err();
        assert!(matches!(err, GuardError::AlreadyRunning { .. }));
        assert!(err.to_string().contains("adminbot.lock"));

        drop(guard);
        assert!(!dir.path().join("adminbot.lock").exists());
        assert!(InstanceGuard::acquire(dir.path(), "adminbot").is_ok());
    }

    #[test]
    fn test_guards_are_per_bot() {
        let dir = tempfile::tempdir().unwrap();
        let _admin = InstanceGuard::acquire(dir.path(), "adminbot").unwrap();
        assert!(InstanceGuard::acquire(dir.path(), "cinemabot").is_ok());
    }
}
