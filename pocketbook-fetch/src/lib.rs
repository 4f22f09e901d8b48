// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Pocketbook Fetch
//!
//! Session-aware HTTP layer for the Pocketbook API.
//!
//! - [`request::ApiRequest`] - Replayable request descriptor, with JSON or
//!   [`form::MultipartForm`] payloads
//! - [`transport::Transport`] - Network seam, with [`transport::HttpTransport`]
//!   as the reqwest implementation
//! - [`client::ApiClient`] - Request and response interceptors bound to a
//!   [`pocketbook_store::SessionStore`]
//! - [`refresh::RefreshCoordinator`] - At most one token refresh in flight
//! - [`rate_limit::parse_retry_after`] - 429 hint parsing
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pocketbook_fetch::{ApiClient, HttpTransport};
//! use pocketbook_store::SessionStore;
//!
//! let transport = HttpTransport::new("http://localhost:3000".parse()?)?;
//! let client = ApiClient::new(Arc::new(transport), SessionStore::new());
//!
//! // A 401 here triggers one shared refresh and a single replay.
//! let response = client.get("/api/user/data").await?;
//! ```

pub mod client;
pub mod error;
pub mod form;
pub mod rate_limit;
pub mod refresh;
pub mod request;
pub mod response;
pub mod transport;

pub use client::ApiClient;
pub use error::{ErrorBody, FetchError};
pub use form::{FormFile, FormPart, MultipartForm};
pub use rate_limit::parse_retry_after;
pub use refresh::{REFRESH_PATH, RefreshCoordinator, RefreshOutcome};
pub use request::{ApiRequest, ReplayState, RequestBody};
pub use response::ApiResponse;
pub use transport::{DEFAULT_TIMEOUT_SECS, HttpTransport, HttpTransportBuilder, Transport};

// Re-exported so callers can build requests without depending on reqwest.
pub use reqwest::{Method, StatusCode};
