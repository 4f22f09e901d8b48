// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Pocketbook API
//!
//! Typed endpoints over [`pocketbook_fetch::ApiClient`].
//!
//! - [`summary::SummaryFetcher`] - Profile, monthly series and category
//!   breakdown, cached in the session store
//! - [`auth::AuthApi`] - Login, registration, logout
//! - [`account::AccountApi`] - Password, email, profile and deletion flows
//! - [`transactions::TransactionsApi`] - Paginated list, upsert, delete
//! - [`savings::SavingsApi`] - Savings allocation
//!
//! [`Pocketbook`] bundles them around one client.

pub mod account;
pub mod auth;
pub mod error;
pub mod savings;
pub mod summary;
pub mod transactions;
mod upload;

use std::sync::Arc;

use pocketbook_fetch::{ApiClient, Transport};
use pocketbook_store::SessionStore;

pub use account::AccountApi;
pub use auth::AuthApi;
pub use error::ApiError;
pub use savings::SavingsApi;
pub use summary::{SummaryFetcher, SummaryRefresh};
pub use transactions::TransactionsApi;

/// Entry point bundling every endpoint group around one [`ApiClient`].
#[derive(Debug, Clone)]
pub struct Pocketbook {
    client: ApiClient,
}

impl Pocketbook {
    /// Wraps an existing client.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Builds a client from a transport and a session store.
    pub fn with_transport(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self::new(ApiClient::new(transport, session))
    }

    /// The underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The session store.
    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    /// Dashboard fetchers.
    pub fn summary(&self) -> SummaryFetcher {
        SummaryFetcher::new(self.client.clone())
    }

    /// Authentication endpoints.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    /// Account endpoints.
    pub fn account(&self) -> AccountApi {
        AccountApi::new(self.client.clone())
    }

    /// Transaction endpoints.
    pub fn transactions(&self) -> TransactionsApi {
        TransactionsApi::new(self.client.clone())
    }

    /// Savings endpoints.
    pub fn savings(&self) -> SavingsApi {
        SavingsApi::new(self.client.clone())
    }
}
