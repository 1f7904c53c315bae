//! Server configuration loaded from `LOGLENS_*` environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `LOGLENS_HOST` | `127.0.0.1` |
//! | `LOGLENS_PORT` | `8080` |
//! | `LOGLENS_DATABASE_PATH` | `{data_dir}/loglens.sqlite` |
//! | `LOGLENS_API_KEY` | required |
//! | `LOGLENS_UI_USER` / `LOGLENS_UI_PASSWORD` | unset (UI is open) |
//! | `LOGLENS_QUERY_TIMEOUT_SECS` | `30`, `0` disables the deadline |

use std::{path::PathBuf, time::Duration};

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use utils::{assets::data_dir, path::expand_tilde};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("LOGLENS_API_KEY must be set to a non-empty value")]
    MissingApiKey,
    #[error("LOGLENS_UI_USER and LOGLENS_UI_PASSWORD must be set together")]
    IncompleteUiAuth,
    #[error("invalid LOGLENS_PORT '{0}'")]
    InvalidPort(String),
    #[error("invalid LOGLENS_QUERY_TIMEOUT_SECS '{0}'")]
    InvalidQueryTimeout(String),
}

/// Credentials guarding the HTML pages.
#[derive(Debug, Clone)]
pub struct UiCredentials {
    pub user: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub api_key: SecretString,
    pub ui_credentials: Option<UiCredentials>,
    /// Deadline applied to every read query; `None` means no deadline.
    pub query_timeout: Option<Duration>,
}

/// Compare secrets without leaking where they first differ.
///
/// Both sides are hashed first so the comparison also hides their lengths.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.as_slice().ct_eq(expected.as_slice()).into()
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("LOGLENS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get("LOGLENS_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let database_path = get("LOGLENS_DATABASE_PATH")
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(|| data_dir().join("loglens.sqlite"));

        let api_key = get("LOGLENS_API_KEY")
            .map(SecretString::from)
            .ok_or(ConfigError::MissingApiKey)?;

        let ui_credentials = match (get("LOGLENS_UI_USER"), get("LOGLENS_UI_PASSWORD")) {
            (Some(user), Some(password)) => Some(UiCredentials {
                user,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteUiAuth),
        };

        let query_timeout = match get("LOGLENS_QUERY_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => return Err(ConfigError::InvalidQueryTimeout(raw)),
            },
            None => Some(Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)),
        };

        Ok(Self {
            host,
            port,
            database_path,
            api_key,
            ui_credentials,
            query_timeout,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn api_key_matches(&self, token: &str) -> bool {
        secrets_match(token, self.api_key.expose_secret())
    }
}

impl UiCredentials {
    pub fn matches(&self, user: &str, password: &str) -> bool {
        // Evaluate both so a wrong user costs the same as a wrong password.
        let user_ok = secrets_match(user, &self.user);
        let password_ok = secrets_match(password, self.password.expose_secret());
        user_ok & password_ok
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("LOGLENS_API_KEY", "k")])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert!(config.ui_credentials.is_none());
        assert_eq!(config.query_timeout, Some(Duration::from_secs(30)));
        assert!(config.database_path.ends_with("loglens.sqlite"));
    }

    #[test]
    fn test_api_key_is_required() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::MissingApiKey
        );
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[("LOGLENS_API_KEY", "  ")])).unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn test_ui_credentials_need_both_halves() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("LOGLENS_API_KEY", "k"),
            ("LOGLENS_UI_USER", "admin"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::IncompleteUiAuth);

        let config = ServerConfig::from_lookup(lookup(&[
            ("LOGLENS_API_KEY", "k"),
            ("LOGLENS_UI_USER", "admin"),
            ("LOGLENS_UI_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let creds = config.ui_credentials.unwrap();
        assert!(creds.matches("admin", "hunter2"));
        assert!(!creds.matches("admin", "hunter3"));
        assert!(!creds.matches("root", "hunter2"));
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[
                ("LOGLENS_API_KEY", "k"),
                ("LOGLENS_PORT", "http")
            ]))
            .unwrap_err(),
            ConfigError::InvalidPort("http".into())
        );
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[
                ("LOGLENS_API_KEY", "k"),
                ("LOGLENS_QUERY_TIMEOUT_SECS", "-1")
            ]))
            .unwrap_err(),
            ConfigError::InvalidQueryTimeout("-1".into())
        );
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("LOGLENS_API_KEY", "k"),
            ("LOGLENS_QUERY_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.query_timeout, None);
    }

    #[test]
    fn test_api_key_matches() {
        let config = ServerConfig::from_lookup(lookup(&[("LOGLENS_API_KEY", "secret")])).unwrap();
        assert!(config.api_key_matches("secret"));
        assert!(!config.api_key_matches("secret "));
        assert!(!config.api_key_matches(""));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe {
            std::env::set_var("LOGLENS_API_KEY", "from-env");
            std::env::set_var("LOGLENS_PORT", "9090");
            std::env::set_var("LOGLENS_DATABASE_PATH", "/tmp/loglens-test.sqlite");
        }
        let config = ServerConfig::from_env();
        unsafe {
            std::env::remove_var("LOGLENS_API_KEY");
            std::env::remove_var("LOGLENS_PORT");
            std::env::remove_var("LOGLENS_DATABASE_PATH");
        }

        let config = config.unwrap();
        assert_eq!(config.port, 9090);
        assert!(config.api_key_matches("from-env"));
        assert_eq!(
            config.database_path,
            PathBuf::from("/tmp/loglens-test.sqlite")
        );
    }
}
