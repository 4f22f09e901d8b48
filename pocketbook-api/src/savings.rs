//! Savings allocation.

use pocketbook_core::SavingsPlan;
use pocketbook_fetch::ApiClient;
use serde_json::json;
use tracing::instrument;

use crate::error::ApiError;

const UPSERT_SAVINGS_PATH: &str = "/api/expense/upsert-savings";

/// Savings endpoints.
#[derive(Debug, Clone)]
pub struct SavingsApi {
    client: ApiClient,
}

impl SavingsApi {
    /// Creates the endpoint group.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Saves the allocation and merges it into the cached profile.
    #[instrument(skip(self, plan), fields(methods = plan.method_count()))]
    pub async fn upsert_savings(&self, plan: &SavingsPlan) -> Result<(), ApiError> {
        self.client
            .post_json(UPSERT_SAVINGS_PATH, &json!({ "savings": plan }))
            .await?;
        self.client.session().modify_user(|user| user.apply_savings(plan));
        Ok(())
    }
}
