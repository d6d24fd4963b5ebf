//! # Configuration Module
//!
//! Process configuration read once from the environment at startup and passed
//! explicitly to every component that needs it.

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CATALOG_PATH: &str = "movies.json";
pub const DEFAULT_LOCK_DIR: &str = ".";

/// Errors raised while building [`AppConfig`]. All of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value {value:?}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Configuration for the whole process (both bots and the webhook server)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Token of the end-user lookup bot
    pub lookup_bot_token: String,
    /// Token of the administrative bot
    pub admin_bot_token: String,
    /// Administrator seeded into a fresh catalog document
    pub seed_admin_id: i64,
    /// Port the webhook server listens on
    pub port: u16,
    /// Location of the shared catalog document
    pub catalog_path: PathBuf,
    /// Directory holding the per-bot instance guard files
    pub lock_dir: PathBuf,
    /// Public base URL; when set, webhooks are registered with Telegram at startup
    pub webhook_base_url: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let lookup_bot_token =
            get("MAIN_BOT_TOKEN").ok_or(ConfigError::Missing("MAIN_BOT_TOKEN"))?;
        let admin_bot_token =
            get("ADMIN_BOT_TOKEN").ok_or(ConfigError::Missing("ADMIN_BOT_TOKEN"))?;

        let raw_admin = get("ADMIN_ID").ok_or(ConfigError::Missing("ADMIN_ID"))?;
        let seed_admin_id = raw_admin.parse::<i64>().map_err(|_| ConfigError::Invalid {
            name: "ADMIN_ID",
            value: raw_admin.clone(),
            expected: "an integer Telegram user id",
        })?;

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
                expected: "a TCP port number",
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        };

        Ok(Self {
            lookup_bot_token,
            admin_bot_token,
            seed_admin_id,
            port,
            catalog_path: get("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            lock_dir: get("LOCK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_DIR)),
            webhook_base_url: get("WEBHOOK_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("MAIN_BOT_TOKEN", "main-token"),
        ("ADMIN_BOT_TOKEN", "admin-token"),
        ("ADMIN_ID", "111"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.seed_admin_id, 111);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.catalog_path, PathBuf::from("movies.json"));
        assert_eq!(config.lock_dir, PathBuf::from("."));
        assert!(config.webhook_base_url.is_none());
        assert_eq!(config.log_format, LogFormat::Plain);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err =
            AppConfig::from_lookup(lookup_from(&[("ADMIN_BOT_TOKEN", "x"), ("ADMIN_ID", "1")]))
                .unwrap_err();
        assert_eq!(err, ConfigError::Missing("MAIN_BOT_TOKEN"));
    }

    #[test]
    fn test_non_numeric_admin_id_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("MAIN_BOT_TOKEN", "a"),
            ("ADMIN_BOT_TOKEN", "b"),
            ("ADMIN_ID", "alice"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ADMIN_ID", .. }));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_optional_values_read() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "9000"),
            ("CATALOG_PATH", "/data/movies.json"),
            ("WEBHOOK_BASE_URL", "https://bots.example.com/"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.catalog_path, PathBuf::from("/data/movies.json"));
        assert_eq!(config.webhook_base_url.as_deref(), Some("https://bots.example.com"));
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
