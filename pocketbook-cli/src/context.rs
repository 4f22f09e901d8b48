//! Per-invocation client setup.

use std::sync::Arc;

use anyhow::{Context, Result};
use pocketbook_api::Pocketbook;
use pocketbook_fetch::HttpTransport;
use pocketbook_store::{ClientSettings, SessionStore, SessionVault};
use tracing::{debug, warn};
use url::Url;

use crate::Cli;

/// Client, transport and keychain vault for one command.
pub struct AppContext {
    pub api: Pocketbook,
    transport: HttpTransport,
    vault: Option<SessionVault>,
}

impl AppContext {
    /// Builds the context from settings and global flags.
    ///
    /// The session cookie saved by a previous run is loaded into the
    /// transport's jar, so the first 401 can be recovered through a refresh.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let settings = ClientSettings::load().await;
        Self::with_settings(cli, &settings)
    }

    /// Builds the context from explicit settings.
    pub fn with_settings(cli: &Cli, settings: &ClientSettings) -> Result<Self> {
        let base_url = settings
            .resolve_base_url(cli.api_url.as_deref())
            .context("Failed to resolve API URL")?;
        debug!(url = %base_url, "Using API");

        let transport = HttpTransport::builder(base_url.clone())
            .timeout(settings.timeout())
            .user_agent_suffix(settings.user_agent_suffix.clone())
            .build()
            .context("Failed to build HTTP client")?;

        let vault = settings
            .remember_session
            .then(|| SessionVault::for_host(&host_key(&base_url)));
        if let Some(cookie) = vault.as_ref().and_then(SessionVault::load) {
            transport.restore_session_cookie(&cookie);
        }

        let api = Pocketbook::with_transport(Arc::new(transport.clone()), SessionStore::new());
        Ok(Self {
            api,
            transport,
            vault,
        })
    }

    /// Saves or drops the session cookie depending on how the command ended.
    ///
    /// Keychain failures are logged, never fatal.
    pub fn persist_session(&self) {
        let Some(vault) = &self.vault else {
            return;
        };

        let session = self.api.session();
        let result = if session.token().is_none() && !session.is_authorized() {
            vault.clear()
        } else if let Some(cookie) = self.transport.session_cookie() {
            vault.store(&cookie)
        } else {
            Ok(())
        };

        if let Err(e) = result {
            warn!(error = %e, "Failed to update saved session");
        }
    }
}

/// `host[:port]` used to scope the keychain entry.
fn host_key(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => url.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key() {
        let url = Url::parse("http://localhost:3000").unwrap();
        assert_eq!(host_key(&url), "localhost:3000");

        let url = Url::parse("https://api.pocketbook.app/v1").unwrap();
        assert_eq!(host_key(&url), "api.pocketbook.app");
    }

    #[tokio::test]
    async fn test_context_uses_flag_url() {
        use clap::Parser;
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/user/data");
                then.status(200)
                    .json_body(serde_json::json!({"user": {"name": "Asha"}}));
            })
            .await;

        let cli = Cli::try_parse_from(["pocketbook", "--api-url", server.base_url().as_str()]).unwrap();
        let settings = ClientSettings {
            remember_session: false,
            ..ClientSettings::default()
        };
        let ctx = AppContext::with_settings(&cli, &settings).unwrap();
        assert!(ctx.vault.is_none());

        let user = ctx.api.summary().fetch_user().await.unwrap();
        assert_eq!(user.name(), Some("Asha"));
        mock.assert_async().await;

        // Without a vault there is nothing to persist.
        ctx.persist_session();
    }
}
