//! Single-flight access token refresh.
//!
//! All callers that need a new token while a refresh is already outstanding
//! await that same refresh instead of starting another one. The slot is
//! cleared when the refresh settles, whatever the outcome, so the next
//! expiry starts a fresh call.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::request::ApiRequest;
use crate::transport::Transport;

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/api/user/refresh";

/// Outcome shared by every waiter: a token, no token, or the failure.
pub type RefreshOutcome = Result<Option<String>, Arc<FetchError>>;

type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    #[serde(default)]
    access_token: Option<String>,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Holds the at-most-one outstanding refresh.
#[derive(Clone, Default)]
pub struct RefreshCoordinator {
    slot: Arc<Mutex<Option<RefreshFuture>>>,
    started: Arc<AtomicUsize>,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_in_flight())
            .field("started", &self.refreshes_started())
            .finish()
    }
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the outstanding refresh, or starts one through `transport`.
    ///
    /// An empty or missing `accessToken` in a success response yields
    /// `Ok(None)`.
    pub async fn refresh(&self, transport: Arc<dyn Transport>) -> RefreshOutcome {
        let shared = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = slot.as_ref() {
                debug!("Joining in-flight token refresh");
                existing.clone()
            } else {
                self.started.fetch_add(1, Ordering::SeqCst);
                let guard = SlotGuard {
                    slot: Arc::clone(&self.slot),
                };
                let future = async move {
                    let _guard = guard;
                    request_access_token(transport.as_ref())
                        .await
                        .map_err(Arc::new)
                }
                .boxed()
                .shared();
                *slot = Some(future.clone());
                future
            }
        };

        shared.await
    }

    /// Returns true while a refresh is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of refresh calls started so far.
    pub fn refreshes_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

/// Empties the slot when the refresh future finishes or is dropped.
struct SlotGuard {
    slot: Arc<Mutex<Option<RefreshFuture>>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let stale = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(stale);
    }
}

/// Calls the refresh endpoint. The request carries no bearer token; the
/// server authenticates it from the refresh cookie.
#[instrument(skip(transport))]
async fn request_access_token(transport: &dyn Transport) -> Result<Option<String>, FetchError> {
    let response = transport.send(&ApiRequest::get(REFRESH_PATH)).await?;
    if !response.is_success() {
        return Err(response.into_error());
    }

    let body: RefreshBody = response.json()?;
    Ok(body.access_token.filter(|token| !token.is_empty()))
}
