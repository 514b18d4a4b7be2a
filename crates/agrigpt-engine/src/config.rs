//! Configuration types for the AgriGPT client.
//!
//! Configuration is a small JSON document. Every field has a default so a
//! missing or partial file still yields a usable client; environment variables
//! are layered on top with [`Config::apply_env`], and binaries may apply
//! command-line flags last.

use crate::topic::Topic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "https://api.alumnx.com/api/agrigpt";

/// Environment variable overriding [`Config::backend_url`].
pub const ENV_BACKEND_URL: &str = "AGRIGPT_BACKEND_URL";

/// Environment variable overriding [`Config::user_email`].
pub const ENV_USER_EMAIL: &str = "AGRIGPT_USER_EMAIL";

/// Environment variable overriding [`Config::language`].
pub const ENV_LANGUAGE: &str = "AGRIGPT_LANG";

/// Main configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the advisory backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Email of the signed-in user. Submissions are refused without one.
    #[serde(default)]
    pub user_email: Option<String>,

    /// Two-letter UI language code, also used to pick the dictation locale.
    #[serde(default = "default_language")]
    pub language: String,

    /// Topic selected when a session starts.
    #[serde(default)]
    pub default_topic: Topic,

    /// Per-request timeout for backend calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// External transcriber used for dictation. `{locale}` is substituted.
    #[serde(default)]
    pub speech_command: Option<Vec<String>>,

    /// Log file used while the terminal UI owns the screen.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.into()
}

fn default_language() -> String {
    "en".into()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            user_email: None,
            language: default_language(),
            default_topic: Topic::default(),
            request_timeout_seconds: default_request_timeout(),
            speech_command: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Overlay `AGRIGPT_*` environment variables onto this configuration.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup (environment in production).
    #[must_use]
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url;
        }
        if let Some(email) = lookup(ENV_USER_EMAIL).filter(|v| !v.trim().is_empty()) {
            self.user_email = Some(email);
        }
        if let Some(lang) = lookup(ENV_LANGUAGE).filter(|v| !v.trim().is_empty()) {
            self.language = lang;
        }
        self
    }

    /// Backend base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// Directory holding the config file and default log.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agrigpt")
    }

    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        Self::default_dir().join("config.json")
    }

    /// Log file to use in TUI mode.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| Self::default_dir().join("agrigpt.log"))
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.language, "en");
        assert_eq!(config.default_topic, Topic::CitrusCrop);
        assert!(config.user_email.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"user_email": "a@b.c"}"#).unwrap();
        assert_eq!(config.user_email.as_deref(), Some("a@b.c"));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.request_timeout_seconds, 120);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            user_email: Some("grower@example.com".into()),
            default_topic: Topic::GovernmentSchemes,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://localhost:9000/api/"),
            (ENV_USER_EMAIL, "farmer@example.com"),
            (ENV_LANGUAGE, ""),
        ]
        .into_iter()
        .collect();

        let config =
            Config::default().apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.base_url(), "http://localhost:9000/api");
        assert_eq!(config.user_email.as_deref(), Some("farmer@example.com"));
        // Blank values are ignored.
        assert_eq!(config.language, "en");
    }
}
