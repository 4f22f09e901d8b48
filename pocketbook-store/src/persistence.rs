//! JSON files under the user's config directory.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Directory under the platform config dir holding Pocketbook files.
const APP_DIR: &str = "pocketbook";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Returns the default configuration directory.
///
/// `~/.config/pocketbook` on Linux, `~/Library/Application Support/pocketbook`
/// on macOS and `%APPDATA%\pocketbook` on Windows. Falls back to the working
/// directory when the platform has no config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join(SETTINGS_FILE)
}

/// Restricts the file to its owner before it becomes visible under its
/// final name.
#[cfg(unix)]
async fn restrict_to_owner(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_to_owner(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// Writes `data` as pretty JSON, replacing `path` atomically.
///
/// Missing parent directories are created. On Unix the file is mode 0600.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, &json).await?;
    restrict_to_owner(&staging).await?;
    tokio::fs::rename(&staging, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "Wrote JSON file");
    Ok(())
}

/// Reads and decodes a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Like [`load_json`], but a missing or unreadable file yields `T::default()`.
///
/// Only decode failures are logged; a missing file is the normal first run.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    load_json(path).await.unwrap_or_else(|e: StoreError| {
        if !e.is_io() {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable file, using defaults");
        }
        T::default()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings_path() {
        let path = default_settings_path();
        assert!(path.ends_with("settings.json"));
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("data.json");

        save_json(&nested, &serde_json::json!({"key": "value"}))
            .await
            .unwrap();

        let loaded: serde_json::Value = load_json(&nested).await.unwrap();
        assert_eq!(loaded["key"], "value");
        assert!(!nested.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_or_default_on_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let loaded: Vec<String> = load_json_or_default(&path).await;
        assert!(loaded.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secure.json");
        save_json(&path, &1u8).await.unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "File should have 0600 permissions");
    }
}
