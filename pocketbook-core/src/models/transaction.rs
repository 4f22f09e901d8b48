//! Transaction types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Transaction Kind
// ============================================================================

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money in.
    Income,
    /// Money out.
    Expense,
}

impl TransactionKind {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Signed amount, negative for expenses.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// A recorded transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Server identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Account the money moved through.
    #[serde(default)]
    pub account: String,
    /// Absolute amount.
    #[serde(default)]
    pub amount: f64,
    /// When the transaction happened.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
    /// Receipt image URL.
    #[serde(default)]
    pub receipt: Option<String>,
}

impl Transaction {
    /// Signed amount, negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }
}

// ============================================================================
// Draft
// ============================================================================

/// Payload for creating or updating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    /// Present when updating an existing transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Category label.
    pub category: String,
    /// Account label.
    pub account: String,
    /// Absolute amount.
    pub amount: f64,
    /// Transaction date. The server defaults to today when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Free-form note.
    #[serde(default)]
    pub description: String,
    /// Deduct an expense from the savings allocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_expense: Option<bool>,
    /// Drop the stored receipt on update.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub remove_receipt: bool,
    /// Receipt image to upload alongside the fields. Sent as a file part.
    #[serde(skip)]
    pub receipt: Option<PathBuf>,
}

impl TransactionDraft {
    /// Creates a new draft.
    pub fn new(
        kind: TransactionKind,
        category: impl Into<String>,
        account: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            transaction_id: None,
            kind,
            category: category.into(),
            account: account.into(),
            amount,
            date: None,
            description: String::new(),
            sync_expense: None,
            remove_receipt: false,
            receipt: None,
        }
    }

    /// Attaches a receipt file.
    #[must_use]
    pub fn with_receipt(mut self, path: impl Into<PathBuf>) -> Self {
        self.receipt = Some(path.into());
        self
    }

    /// Checks the fields the server would reject outright.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.category.trim().is_empty() {
            return Err(CoreError::InvalidData("category is required".to_string()));
        }
        if self.account.trim().is_empty() {
            return Err(CoreError::InvalidData("account is required".to_string()));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CoreError::InvalidData(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.remove_receipt && self.receipt.is_some() {
            return Err(CoreError::InvalidData(
                "cannot attach and remove a receipt at once".to_string(),
            ));
        }
        if self.sync_expense.is_some() && self.kind == TransactionKind::Income {
            return Err(CoreError::InvalidData(
                "sync_expense only applies to expenses".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Filter & Page
// ============================================================================

/// Kind filter for the transaction list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindFilter {
    /// Both directions.
    #[default]
    All,
    /// Only income.
    Income,
    /// Only expenses.
    Expense,
}

impl KindFilter {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for KindFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            other => other.parse::<TransactionKind>().map(|k| match k {
                TransactionKind::Income => Self::Income,
                TransactionKind::Expense => Self::Expense,
            }),
        }
    }
}

/// Query for the paginated transaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    /// 1-indexed page.
    pub page: u32,
    /// Free-text search.
    pub search: String,
    /// Direction filter.
    pub kind: KindFilter,
    /// Restrict to these accounts (empty = all accounts).
    pub accounts: Vec<String>,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
            kind: KindFilter::All,
            accounts: Vec::new(),
        }
    }
}

impl TransactionFilter {
    /// Query pairs in the order the server expects.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("search".to_string(), self.search.clone()),
            ("filter".to_string(), self.kind.as_str().to_string()),
        ];
        if !self.accounts.is_empty() {
            pairs.push(("accounts".to_string(), self.accounts.join(",")));
        }
        pairs
    }
}

fn default_pages() -> u32 {
    1
}

/// One page of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    /// Transactions on this page.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Total number of pages.
    #[serde(default = "default_pages")]
    pub pages: u32,
}

impl TransactionPage {
    /// Net amount over this page.
    pub fn net(&self) -> f64 {
        self.transactions.iter().map(Transaction::signed_amount).sum()
    }
}

// ============================================================================
// Tests
// ============================================================================
