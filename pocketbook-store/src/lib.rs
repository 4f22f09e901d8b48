// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Pocketbook Store
//!
//! Client-side state for the Pocketbook application.
//!
//! This crate provides:
//!
//! - **SessionStore**: bearer token, loading/authorization/rate-limit flags and
//!   cached dashboard data, observable through a watch channel
//! - **ClientSettings**: API base URL and transport preferences with persistence
//! - **SessionVault**: keychain storage for the refresh credential
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use pocketbook_store::SessionStore;
//!
//! let session = SessionStore::new();
//! session.set_token("eyJ...");
//!
//! // Subscribe to changes
//! let mut rx = session.subscribe();
//! while rx.changed().await.is_ok() {
//!     let state = rx.borrow_and_update().clone();
//!     println!("loading: {}", state.is_loading);
//! }
//! ```

pub mod error;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod vault;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, load_json, load_json_or_default, save_json,
};
pub use session::{DEFAULT_RETRY_AFTER_SECS, SessionState, SessionStore};
pub use settings::{
    API_URL_ENV, ClientSettings, DEFAULT_API_BASE_URL, compiled_api_base_url, parse_base_url,
};
pub use vault::SessionVault;
