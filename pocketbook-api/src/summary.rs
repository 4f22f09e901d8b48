//! Dashboard data fetchers.
//!
//! Each fetcher makes one logical call, projects the field it needs out of
//! the body, writes it into the [`SessionStore`] and hands it back. Failures
//! leave an advisory message in the store and are returned to the caller.

use pocketbook_core::{CategoryTotal, MonthlySeries, MonthlyTotal, UserProfile};
use pocketbook_fetch::{ApiClient, FetchError};
use pocketbook_store::SessionStore;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::error::ApiError;

/// Profile endpoint.
pub const USER_DATA_PATH: &str = "/api/user/data";
/// Monthly expense totals endpoint.
pub const EXPENSES_PER_MONTH_PATH: &str = "/api/expense/expenses-per-month";
/// Top categories endpoint.
pub const TOP_EXPENSES_PATH: &str = "/api/expense/top-five-expenses";

/// Which parts of a summary refresh failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRefresh {
    /// Names of the fetchers that failed.
    pub failed: Vec<&'static str>,
}

impl SummaryRefresh {
    /// Returns true when every fetcher succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches and caches dashboard data.
#[derive(Debug, Clone)]
pub struct SummaryFetcher {
    client: ApiClient,
}

impl SummaryFetcher {
    /// Creates a fetcher.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn session(&self) -> &SessionStore {
        self.client.session()
    }

    /// Records the advisory error and converts for the caller.
    fn record(&self, err: FetchError, fallback: &str) -> ApiError {
        let message = err.server_message().unwrap_or(fallback).to_string();
        self.session().set_error(message);
        ApiError::from(err)
    }

    /// Loads the signed-in user's profile.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self) -> Result<UserProfile, ApiError> {
        let result = async {
            let response = self.client.get(USER_DATA_PATH).await?;
            response.field::<UserProfile>(USER_DATA_PATH, "user")
        }
        .await;

        match result {
            Ok(user) => {
                self.session().set_user(user.clone());
                self.session().set_authorized(true);
                Ok(user)
            }
            Err(e) => Err(self.record(e, "Failed to fetch user")),
        }
    }

    /// Loads the twelve monthly expense totals for `year`.
    #[instrument(skip(self))]
    pub async fn get_expenses_per_month(&self, year: i32) -> Result<MonthlySeries, ApiError> {
        let result = async {
            let response = self
                .client
                .post_json(EXPENSES_PER_MONTH_PATH, &json!({ "year": year }))
                .await?;
            response.field::<Vec<MonthlyTotal>>(EXPENSES_PER_MONTH_PATH, "expenses")
        }
        .await;

        match result {
            Ok(totals) => {
                let series = MonthlySeries::from_totals(&totals);
                debug!(entries = totals.len(), total = series.total(), "Monthly expenses loaded");
                self.session().set_expenses_per_month(series);
                Ok(series)
            }
            Err(e) => Err(self.record(e, "Failed to get expenses per months")),
        }
    }

    /// Loads the top expense categories.
    ///
    /// Unlike the other fetchers this one leaves `last_error` alone.
    #[instrument(skip(self))]
    pub async fn get_donut_data(&self) -> Result<Vec<CategoryTotal>, ApiError> {
        let response = self.client.get(TOP_EXPENSES_PATH).await?;
        let categories: Vec<CategoryTotal> = response.field(TOP_EXPENSES_PATH, "categories")?;
        self.session().set_category_breakdown(categories.clone());
        Ok(categories)
    }

    /// Exchanges the refresh credential for a new access token.
    ///
    /// Joins any refresh already in flight. On failure the token is
    /// cleared and the error recorded.
    #[instrument(skip(self))]
    pub async fn refresh_auth_token(&self) -> Result<String, ApiError> {
        self.session().clear_error();

        match self.client.refresh_access_token().await {
            Ok(token) => Ok(token),
            Err(e) => {
                let err = self.record(e, "Failed to refresh token");
                self.session().set_token("");
                Err(err)
            }
        }
    }

    /// Reloads profile, monthly series and category breakdown concurrently.
    ///
    /// Individual failures are logged and reported, never returned as an
    /// error; whatever did not load stays stale.
    #[instrument(skip(self))]
    pub async fn refresh_all_summary_data(&self, year: i32) -> SummaryRefresh {
        let (user, expenses, categories) = futures::join!(
            self.fetch_user(),
            self.get_expenses_per_month(year),
            self.get_donut_data(),
        );

        let mut report = SummaryRefresh::default();
        for (name, error) in [
            ("user", user.err()),
            ("expenses", expenses.err()),
            ("categories", categories.err()),
        ] {
            if let Some(error) = error {
                warn!(part = name, error = %error, "Failed to refresh summary data");
                report.failed.push(name);
            }
        }
        report
    }
}
