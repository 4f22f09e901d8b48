//! Transaction list and edits.

use chrono::Datelike;
use pocketbook_core::{TransactionDraft, TransactionFilter, TransactionPage};
use pocketbook_fetch::{ApiClient, ApiRequest, FetchError, MultipartForm};
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::summary::{SummaryFetcher, SummaryRefresh};
use crate::upload::read_attachment;

const FILTERED_PATH: &str = "/api/user/filtered-tnx";
const UPSERT_PATH: &str = "/api/expense/upsert-transaction";
const DELETE_PATH: &str = "/api/expense/delete-transaction";

/// Transaction endpoints.
///
/// Edits are followed by a summary refresh for the current year, since
/// every dashboard figure may have moved.
#[derive(Debug, Clone)]
pub struct TransactionsApi {
    client: ApiClient,
}

impl TransactionsApi {
    /// Creates the endpoint group.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetches one page of transactions.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &TransactionFilter) -> Result<TransactionPage, ApiError> {
        let request = ApiRequest::get(FILTERED_PATH).query(filter.query_pairs());
        let page: TransactionPage = self.client.execute(request).await?.json()?;
        debug!(count = page.transactions.len(), pages = page.pages, "Transactions loaded");
        Ok(page)
    }

    /// Creates or updates a transaction.
    ///
    /// A draft with a receipt goes out as a multipart form: every field as
    /// text plus the file under `receipt`. Otherwise the body is JSON.
    #[instrument(skip(self, draft), fields(kind = %draft.kind, update = draft.transaction_id.is_some()))]
    pub async fn upsert(&self, draft: &TransactionDraft) -> Result<SummaryRefresh, ApiError> {
        draft.validate()?;

        match &draft.receipt {
            Some(path) => {
                let receipt = read_attachment(path).await?;
                let fields = serde_json::to_value(draft).map_err(FetchError::from)?;
                let form = MultipartForm::from_json_fields(&fields)?.file("receipt", receipt);
                self.client.post_form(UPSERT_PATH, form).await?;
            }
            None => {
                self.client.post_json(UPSERT_PATH, draft).await?;
            }
        }
        Ok(self.refresh_summaries().await)
    }

    /// Deletes a transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<SummaryRefresh, ApiError> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(ApiError::invalid(format!("invalid transaction id: {id:?}")));
        }

        self.client.delete(&format!("{DELETE_PATH}/{id}")).await?;
        Ok(self.refresh_summaries().await)
    }

    async fn refresh_summaries(&self) -> SummaryRefresh {
        let year = chrono::Local::now().year();
        SummaryFetcher::new(self.client.clone())
            .refresh_all_summary_data(year)
            .await
    }
}
