//! Session state store.
//!
//! Single source of truth for the bearer token, the UI-blocking flags and
//! the cached dashboard data. Reads are synchronous snapshots; writes go
//! through the named operations below so every transition is auditable.
//! Each write bumps [`SessionState::version`] and wakes subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pocketbook_core::{CategoryTotal, MonthlySeries, UserProfile};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Countdown used when a 429 carries no usable retry hint.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ============================================================================
// Session State
// ============================================================================

/// Snapshot of the client session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Current bearer token (empty when signed out).
    pub bearer_token: String,
    /// Whether the last authenticated exchange succeeded.
    pub is_authorized: bool,
    /// Whether a request is in flight.
    pub is_loading: bool,
    /// Whether the server throttled the client.
    pub is_rate_limited: bool,
    /// Countdown taken from the most recent 429.
    pub retry_after_secs: u64,
    /// When the client was last marked rate-limited.
    pub rate_limited_at: Option<DateTime<Utc>>,
    /// Advisory message from the last failed fetch.
    pub last_error: Option<String>,
    /// Cached profile.
    pub user: Option<UserProfile>,
    /// Cached 12-slot expense series.
    pub expenses_per_month: Option<MonthlySeries>,
    /// Cached top-category breakdown.
    pub category_breakdown: Option<Vec<CategoryTotal>>,
    /// Bumped on every mutation.
    pub version: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            is_authorized: true,
            is_loading: false,
            is_rate_limited: false,
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
            rate_limited_at: None,
            last_error: None,
            user: None,
            expenses_per_month: None,
            category_breakdown: None,
            version: 0,
        }
    }
}

impl SessionState {
    /// Returns true when a bearer token is held.
    pub fn has_token(&self) -> bool {
        !self.bearer_token.is_empty()
    }

    /// Seconds left on the rate-limit countdown at `now`.
    pub fn rate_limit_remaining_at(&self, now: DateTime<Utc>) -> u64 {
        if !self.is_rate_limited {
            return 0;
        }
        let Some(started) = self.rate_limited_at else {
            return self.retry_after_secs;
        };
        let elapsed = u64::try_from(now.signed_duration_since(started).num_seconds()).unwrap_or(0);
        self.retry_after_secs.saturating_sub(elapsed)
    }
}

// ============================================================================
// Session Store
// ============================================================================

/// Shared, observable session store.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store in the initial signed-out state.
    pub fn new() -> Self {
        Self::with_state(SessionState::default())
    }

    /// Creates a store seeded with `state`.
    pub fn with_state(state: SessionState) -> Self {
        let (tx, _) = watch::channel(state);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Applies a mutation and notifies subscribers.
    fn update(&self, mutate: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(|state| {
            mutate(state);
            state.version += 1;
        });
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        let state = self.state.borrow();
        state.has_token().then(|| state.bearer_token.clone())
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Whether the session is authorized.
    pub fn is_authorized(&self) -> bool {
        self.state.borrow().is_authorized
    }

    /// Whether the client is rate-limited.
    pub fn is_rate_limited(&self) -> bool {
        self.state.borrow().is_rate_limited
    }

    /// Countdown taken from the most recent 429.
    pub fn retry_after_secs(&self) -> u64 {
        self.state.borrow().retry_after_secs
    }

    /// Seconds left before the rate-limit block lifts.
    pub fn rate_limit_remaining(&self) -> u64 {
        self.state.borrow().rate_limit_remaining_at(Utc::now())
    }

    /// Last advisory error.
    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Cached profile.
    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    /// Cached expense series.
    pub fn expenses_per_month(&self) -> Option<MonthlySeries> {
        self.state.borrow().expenses_per_month
    }

    /// Cached category breakdown.
    pub fn category_breakdown(&self) -> Option<Vec<CategoryTotal>> {
        self.state.borrow().category_breakdown.clone()
    }

    // ========================================================================
    // Session Flags
    // ========================================================================

    /// Replaces the bearer token.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        debug!(present = !token.is_empty(), "Token updated");
        self.update(|s| s.bearer_token = token);
    }

    /// Sets the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.update(|s| s.is_loading = loading);
    }

    /// Sets the authorization flag.
    pub fn set_authorized(&self, authorized: bool) {
        self.update(|s| s.is_authorized = authorized);
    }

    /// Sets the rate-limit flag. Raising it restarts the countdown.
    pub fn set_rate_limited(&self, limited: bool) {
        if limited {
            warn!("Client rate limited");
        }
        self.update(|s| {
            s.is_rate_limited = limited;
            s.rate_limited_at = limited.then(Utc::now);
        });
    }

    /// Stores the countdown from a 429.
    pub fn set_retry_after(&self, seconds: u64) {
        self.update(|s| s.retry_after_secs = seconds);
    }

    /// Lifts the rate-limit block once the countdown has elapsed.
    ///
    /// Returns false, leaving the block in place, while time remains.
    pub fn acknowledge_rate_limit(&self) -> bool {
        if self.rate_limit_remaining() > 0 {
            return false;
        }
        self.set_rate_limited(false);
        true
    }

    /// Signs the session out: drops the token and every cached projection.
    pub fn clear_session(&self) {
        info!("Clearing session");
        self.update(|s| {
            s.bearer_token.clear();
            s.is_authorized = false;
            s.last_error = None;
            s.user = None;
            s.expenses_per_month = None;
            s.category_breakdown = None;
        });
    }

    // ========================================================================
    // Cached Data
    // ========================================================================

    /// Replaces the cached profile.
    pub fn set_user(&self, user: UserProfile) {
        self.update(|s| s.user = Some(user));
    }

    /// Edits the cached profile in place, if one is cached.
    pub fn modify_user(&self, edit: impl FnOnce(&mut UserProfile)) {
        self.update(|s| {
            if let Some(user) = s.user.as_mut() {
                edit(user);
            }
        });
    }

    /// Replaces the cached expense series.
    pub fn set_expenses_per_month(&self, series: MonthlySeries) {
        self.update(|s| s.expenses_per_month = Some(series));
    }

    /// Replaces the cached category breakdown.
    pub fn set_category_breakdown(&self, categories: Vec<CategoryTotal>) {
        self.update(|s| s.category_breakdown = Some(categories));
    }

    /// Records an advisory error.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(error = %message, "Session error recorded");
        self.update(|s| s.last_error = Some(message));
    }

    /// Clears the advisory error.
    pub fn clear_error(&self) {
        self.update(|s| s.last_error = None);
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Subscribes to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================
