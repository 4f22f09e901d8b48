//! Client settings.
//!
//! The API base URL is resolved from, in order: an explicit override, the
//! `POCKETBOOK_API_URL` environment variable, the settings file, the value
//! baked in at build time through `POCKETBOOK_API_BASEURL`, and finally
//! [`DEFAULT_API_BASE_URL`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json_or_default, save_json};

/// Fallback API base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Environment variable consulted at runtime.
pub const API_URL_ENV: &str = "POCKETBOOK_API_URL";

/// Returns the API base URL configured at build time, if any.
pub fn compiled_api_base_url() -> Option<&'static str> {
    option_env!("POCKETBOOK_API_BASEURL").filter(|v| !v.trim().is_empty())
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Persisted client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// API base URL. `None` defers to the environment or build-time value.
    pub api_base_url: Option<String>,
    /// Transport timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra text appended to the user agent.
    pub user_agent_suffix: Option<String>,
    /// Keep the refresh credential in the OS keychain between runs.
    #[serde(default = "default_true")]
    pub remember_session: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            timeout_secs: default_timeout_secs(),
            user_agent_suffix: None,
            remember_session: true,
        }
    }
}

impl ClientSettings {
    /// Loads settings from the default path.
    pub async fn load() -> Self {
        Self::load_from(&default_settings_path()).await
    }

    /// Loads settings from `path`, falling back to defaults.
    pub async fn load_from(path: &Path) -> Self {
        let settings: Self = load_json_or_default(path).await;
        debug!(path = %path.display(), "Loaded client settings");
        settings
    }

    /// Saves settings to the default path.
    pub async fn save(&self) -> Result<PathBuf, StoreError> {
        let path = default_settings_path();
        self.save_to(&path).await?;
        Ok(path)
    }

    /// Saves settings to `path`.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved client settings");
        Ok(())
    }

    /// Transport timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Resolves the effective API base URL.
    ///
    /// `override_url` wins over everything else (e.g. a CLI flag).
    pub fn resolve_base_url(&self, override_url: Option<&str>) -> Result<Url, StoreError> {
        let env_url = std::env::var(API_URL_ENV).ok();
        let raw = override_url
            .or(env_url.as_deref())
            .or(self.api_base_url.as_deref())
            .or(compiled_api_base_url())
            .unwrap_or(DEFAULT_API_BASE_URL);

        parse_base_url(raw)
    }
}

/// Parses and validates an API base URL.
pub fn parse_base_url(raw: &str) -> Result<Url, StoreError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| StoreError::Config(format!("invalid API URL '{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(StoreError::Config(format!(
            "API URL must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(StoreError::Config(format!("API URL '{raw}' has no host")));
    }
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_override_wins() {
        let settings = ClientSettings {
            api_base_url: Some("https://settings.example.com".to_string()),
            ..Default::default()
        };

        let url = settings
            .resolve_base_url(Some("https://flag.example.com"))
            .unwrap();
        assert_eq!(url.host_str(), Some("flag.example.com"));
    }

    #[test]
    fn test_parse_base_url_rejects_bad_scheme() {
        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("https://api.example.com/v1").is_ok());
    }

    #[test]
    fn test_timeout_never_zero() {
        let settings = ClientSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"api_base_url": "https://x.example.com"}"#).unwrap();
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.remember_session);
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let settings = ClientSettings {
            api_base_url: Some("https://api.example.com".to_string()),
            timeout_secs: 12,
            user_agent_suffix: Some("ci".to_string()),
            remember_session: false,
        };
        settings.save_to(&path).await.unwrap();

        assert_eq!(ClientSettings::load_from(&path).await, settings);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = ClientSettings::load_from(&temp_dir.path().join("missing.json")).await;
        assert_eq!(loaded, ClientSettings::default());
    }
}
