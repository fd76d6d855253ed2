//! Application configuration.
//!
//! Read from `$POMODORO_SYNC_CONFIG`, or `<config dir>/pomodoro-sync/config.json`
//! when that is unset. A missing file means defaults. `POMODORO_USER` and
//! `POMODORO_SOCKET` override the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::RestStoreConfig;
use crate::types::UserId;

/// Directory name under the platform config/data dirs.
pub const APP_DIR: &str = "pomodoro-sync";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "POMODORO_SYNC_CONFIG";

/// Environment variable overriding `user_id`.
pub const USER_ENV: &str = "POMODORO_USER";

/// Environment variable overriding `socket_path`.
pub const SOCKET_ENV: &str = "POMODORO_SOCKET";

/// Socket path relative to the home directory.
const DEFAULT_SOCKET_PATH: &str = ".pomodoro-sync/pomodoro.sock";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルを読み込めません ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("設定ファイルの形式が不正です ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("設定値が不正です: {0}")]
    Invalid(String),

    #[error("ホームディレクトリが見つかりません")]
    NoHomeDir,
}

/// Which session store the daemon uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Kept in memory; lost when the daemon exits
    Memory,
    /// Local SQLite file
    Sqlite {
        #[serde(default = "default_database_path")]
        path: PathBuf,
    },
    /// Hosted PostgREST project
    Rest(RestStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("sessions.db")
}

fn default_true() -> bool {
    true
}

/// Daemon and client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// IPC socket; defaults to `~/.pomodoro-sync/pomodoro.sock`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    /// User signed in when the daemon starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    /// Play a cue when a period ends
    #[serde(default = "default_true")]
    pub sound: bool,
    /// Custom cue file; the built-in chime when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<PathBuf>,
    /// Show desktop alerts when a period ends
    #[serde(default = "default_true")]
    pub desktop_notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            user_id: None,
            store: StoreConfig::default(),
            sound: true,
            sound_file: None,
            desktop_notifications: true,
        }
    }
}

impl AppConfig {
    /// Path of the config file that [`load`](Self::load) reads.
    pub fn config_file() -> PathBuf {
        match env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("config.json"),
        }
    }

    /// Loads the config file and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_file())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Some(user) = env::var(USER_ENV).ok().filter(|u| !u.trim().is_empty()) {
            self.user_id = Some(user);
        }
        if let Some(socket) = env::var_os(SOCKET_ENV).filter(|s| !s.is_empty()) {
            self.socket_path = Some(PathBuf::from(socket));
        }
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(user) = &self.user_id {
            UserId::new(user.as_str()).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if let StoreConfig::Rest(rest) = &self.store {
            if !(rest.url.starts_with("http://") || rest.url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "store.url は http(s) で始まる必要があります: {}",
                    rest.url
                )));
            }
            if rest.api_key.trim().is_empty() {
                return Err(ConfigError::Invalid("store.api_key が空です".to_string()));
            }
        }
        Ok(())
    }

    /// Socket path, resolving the default against the home directory.
    pub fn socket_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => default_socket_path(),
        }
    }

    /// The configured initial user, if any.
    pub fn user(&self) -> Option<UserId> {
        self.user_id
            .as_deref()
            .and_then(|id| UserId::new(id).ok())
    }
}

/// `~/.pomodoro-sync/pomodoro.sock`.
pub fn default_socket_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_SOCKET_PATH))
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.json")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(config.sound);
        assert!(config.desktop_notifications);
        assert!(matches!(config.store, StoreConfig::Sqlite { .. }));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (_dir, path) = write_config(r#"{"user_id":"alice","store":{"kind":"memory"}}"#);

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.user().map(|u| u.to_string()), Some("alice".to_string()));
        assert_eq!(config.store, StoreConfig::Memory);
        assert!(config.sound);
    }

    #[test]
    fn test_sqlite_path_and_flags() {
        let (_dir, path) = write_config(
            r#"{"store":{"kind":"sqlite","path":"/tmp/p.db"},"sound":false,"desktop_notifications":false}"#,
        );

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(
            config.store,
            StoreConfig::Sqlite {
                path: PathBuf::from("/tmp/p.db")
            }
        );
        assert!(!config.sound);
        assert!(!config.desktop_notifications);
    }

    #[test]
    fn test_rest_store() {
        let (_dir, path) = write_config(
            r#"{"store":{"kind":"rest","url":"https://x.supabase.co","api_key":"anon"}}"#,
        );

        let config = AppConfig::load_from(&path).unwrap();

        assert!(config.validate().is_ok());
        assert!(matches!(config.store, StoreConfig::Rest(ref r) if r.api_key == "anon"));
    }

    #[test]
    fn test_malformed_file() {
        let (_dir, path) = write_config("{ not json");
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AppConfig {
            user_id: Some("   ".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = AppConfig {
            store: StoreConfig::Rest(RestStoreConfig {
                url: "ftp://x".to_string(),
                api_key: "k".to_string(),
                access_token: None,
            }),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_explicit_socket_path() {
        let config = AppConfig {
            socket_path: Some(PathBuf::from("/tmp/x.sock")),
            ..AppConfig::default()
        };
        assert_eq!(config.socket_path().unwrap(), PathBuf::from("/tmp/x.sock"));
    }
}
