//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pocketbook_core::{CategoryTotal, Transaction, TransactionPage, UserProfile};
use pocketbook_store::SessionState;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// Dashboard summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutput {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_expenses: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Profile fields shown on the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    pub current_saved: f64,
}

/// One category slice.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOutput {
    pub category: String,
    pub amount: f64,
    pub share_percent: f64,
}

/// Rate-limit state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitOutput {
    pub retry_after_secs: u64,
    pub remaining_secs: u64,
}

/// One page of transactions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPageOutput {
    pub page: u32,
    pub pages: u32,
    pub net: f64,
    pub transactions: Vec<TransactionOutput>,
}

/// A single transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub account: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// Serialization helpers
// ============================================================================

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the dashboard held in the session.
    pub fn format_summary(&self, state: &SessionState, year: i32) -> Result<String> {
        self.format(&Self::summary_output(state, year, Utc::now()))
    }

    /// Formats one page of transactions.
    pub fn format_transactions(&self, page: &TransactionPage, page_number: u32) -> Result<String> {
        self.format(&Self::page_output(page, page_number))
    }

    /// Builds the summary output at `now`.
    pub fn summary_output(state: &SessionState, year: i32, now: DateTime<Utc>) -> SummaryOutput {
        SummaryOutput {
            year,
            user: state.user.as_ref().map(Self::profile_output),
            monthly_expenses: state.expenses_per_month.map(|s| s.as_slice().to_vec()),
            categories: state.category_breakdown.as_deref().map(Self::category_outputs),
            savings_total: state
                .user
                .as_ref()
                .and_then(UserProfile::savings)
                .map(|plan| plan.total()),
            rate_limit: state.is_rate_limited.then(|| RateLimitOutput {
                retry_after_secs: state.retry_after_secs,
                remaining_secs: state.rate_limit_remaining_at(now),
            }),
            error: state.last_error.clone(),
        }
    }

    fn profile_output(user: &UserProfile) -> ProfileOutput {
        ProfileOutput {
            name: user.name().map(str::to_string),
            email: user.email().map(str::to_string),
            income: user.income(),
            expense: user.expense(),
            goal: user.goal(),
            current_saved: user.current_saved(),
        }
    }

    fn category_outputs(categories: &[CategoryTotal]) -> Vec<CategoryOutput> {
        let total: f64 = categories.iter().map(|c| c.amount).sum();
        categories
            .iter()
            .map(|c| CategoryOutput {
                category: c.category.clone(),
                amount: c.amount,
                share_percent: c.share_of(total),
            })
            .collect()
    }

    /// Builds the transaction page output.
    pub fn page_output(page: &TransactionPage, page_number: u32) -> TransactionPageOutput {
        TransactionPageOutput {
            page: page_number.max(1),
            pages: page.pages,
            net: page.net(),
            transactions: page.transactions.iter().map(Self::transaction_output).collect(),
        }
    }

    fn transaction_output(transaction: &Transaction) -> TransactionOutput {
        TransactionOutput {
            id: transaction.id.clone(),
            kind: transaction.kind.to_string(),
            category: transaction.category.clone(),
            account: transaction.account.clone(),
            amount: transaction.amount,
            date: transaction.date,
            description: transaction.description.clone().filter(|d| !d.is_empty()),
        }
    }
}
