//! CLI command implementations.

pub mod account;
pub mod auth;
pub mod config;
pub mod savings;
pub mod summary;
pub mod transactions;
pub mod watch;

use chrono::Datelike;
use pocketbook_fetch::FetchError;

use crate::context::AppContext;

/// Calendar year in local time.
pub(crate) fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Fails with a session-terminal error once the store has been signed out.
///
/// Commands that swallow per-fetch failures use this so the exit code still
/// reports an expired session.
pub(crate) fn ensure_authorized(ctx: &AppContext) -> anyhow::Result<()> {
    if ctx.api.session().is_authorized() {
        return Ok(());
    }
    Err(FetchError::authentication_failed(
        "session expired, run `pocketbook login` to sign in again",
        None,
    )
    .into())
}
