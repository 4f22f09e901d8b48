//! Domain models for Pocketbook.
//!
//! The client treats most payloads as pass-through data. Only the fields the
//! dashboard and the session layer read are typed.
//!
//! ## Submodules
//!
//! - [`profile`] - The signed-in user's profile
//! - [`summary`] - Monthly totals and the category breakdown
//! - [`transaction`] - Transactions, drafts, filters and pages
//! - [`savings`] - Savings allocations

mod profile;
mod savings;
mod summary;
mod transaction;

// Re-export everything at the models level
pub use profile::UserProfile;
pub use savings::{SavingsEntry, SavingsPlan};
pub use summary::{CategoryTotal, MONTHS_PER_YEAR, MonthlySeries, MonthlyTotal};
pub use transaction::{
    KindFilter, Transaction, TransactionDraft, TransactionFilter, TransactionKind,
    TransactionPage,
};
