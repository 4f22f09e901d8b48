//! Keychain storage for the refresh credential.
//!
//! The API refreshes bearer tokens from a session cookie. A browser keeps that
//! cookie for us; a command-line client has to persist it itself. The cookie
//! header is stored per API host in the system keychain:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)

use keyring::Entry;
use tracing::debug;

use crate::error::StoreError;

/// Service name prefix for `Pocketbook` credentials.
const SERVICE_PREFIX: &str = "Pocketbook";

/// Keychain account holding the cookie header.
const ACCOUNT: &str = "session_cookie";

/// Keychain-backed store for the session cookie of one API host.
#[derive(Debug, Clone)]
pub struct SessionVault {
    service: String,
}

impl SessionVault {
    /// Creates a vault scoped to `host`.
    pub fn for_host(host: &str) -> Self {
        Self {
            service: format!("{SERVICE_PREFIX}-{host}"),
        }
    }

    /// Keychain service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, ACCOUNT)?)
    }

    /// Stores the cookie header.
    pub fn store(&self, cookie_header: &str) -> Result<(), StoreError> {
        self.entry()?.set_password(cookie_header)?;
        debug!(service = %self.service, "Session cookie stored in keychain");
        Ok(())
    }

    /// Loads the cookie header, if one is stored.
    pub fn load(&self) -> Option<String> {
        let entry = self.entry().ok()?;
        match entry.get_password() {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(service = %self.service, error = %e, "No session cookie in keychain");
                None
            }
        }
    }

    /// Removes the stored cookie. A missing entry is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, "Session cookie removed from keychain");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_format() {
        let vault = SessionVault::for_host("api.example.com");
        assert_eq!(vault.service(), "Pocketbook-api.example.com");
    }

    // Actual keychain access needs platform services and is not exercised here.
}
