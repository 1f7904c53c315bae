use std::{borrow::Cow, path::PathBuf};

use directories::ProjectDirs;
use rust_embed::RustEmbed;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Directory holding the database and file logs.
///
/// Respects `LOGLENS_DATA_DIR`. Debug builds default to `dev_assets/` at the
/// workspace root so local runs never touch the user's real data directory.
/// The directory is not created here; callers create it when they need it.
pub fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("LOGLENS_DATA_DIR") {
        return crate::path::expand_tilde(&path);
    }

    if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("dev", "loglens", "loglens")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".loglens"))
    }
    // ✔ macOS → ~/Library/Application Support/dev.loglens.loglens
    // ✔ Linux → ~/.local/share/loglens   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\loglens\loglens
}

/// Get the database file path.
///
/// Respects the `LOGLENS_DATABASE_PATH` environment variable for custom locations.
/// Supports tilde expansion (e.g., `~/loglens/logs.sqlite`).
///
/// Default: `{data_dir}/loglens.sqlite`
pub fn database_path() -> PathBuf {
    if let Ok(path) = std::env::var("LOGLENS_DATABASE_PATH") {
        return crate::path::expand_tilde(&path);
    }
    data_dir().join("loglens.sqlite")
}

/// Default: `{data_dir}/logs`
pub fn log_dir() -> PathBuf {
    if let Ok(path) = std::env::var("LOGLENS_LOG_DIR") {
        return crate::path::expand_tilde(&path);
    }
    data_dir().join("logs")
}

/// Static files served under `/assets`.
#[derive(RustEmbed)]
#[folder = "../../assets/ui"]
pub struct UiAssets;

/// Bytes of an embedded UI file, by path relative to `assets/ui`.
pub fn ui_asset(path: &str) -> Option<Cow<'static, [u8]>> {
    UiAssets::get(path).map(|file| file.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_database_path_default() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::remove_var("LOGLENS_DATABASE_PATH") };
        let path = database_path();
        assert!(path.ends_with("loglens.sqlite"));
    }

    #[test]
    #[serial]
    fn test_database_path_env_override() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("LOGLENS_DATABASE_PATH", "/custom/path/test.db") };
        let path = database_path();
        unsafe { env::remove_var("LOGLENS_DATABASE_PATH") };
        assert_eq!(path, PathBuf::from("/custom/path/test.db"));
    }

    #[test]
    #[serial]
    fn test_database_path_follows_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe {
            env::remove_var("LOGLENS_DATABASE_PATH");
            env::set_var("LOGLENS_DATA_DIR", temp.path().to_str().unwrap());
        }
        let path = database_path();
        unsafe { env::remove_var("LOGLENS_DATA_DIR") };
        assert_eq!(path, temp.path().join("loglens.sqlite"));
    }

    #[test]
    #[serial]
    fn test_log_dir_tilde_expansion() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("LOGLENS_LOG_DIR", "~/loglens-logs") };
        let dir = log_dir();
        unsafe { env::remove_var("LOGLENS_LOG_DIR") };
        assert!(!dir.to_string_lossy().contains('~'));
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_stylesheet_is_embedded() {
        assert!(UiAssets::get("loglens.css").is_some());
        assert!(ui_asset("missing.css").is_none());
    }
}
