// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Pocketbook` Core
//!
//! Core types and models for the `Pocketbook` finance tracker client.
//!
//! This crate provides the foundational types used across all other
//! `Pocketbook` crates:
//!
//! - Domain models (profile, summaries, transactions, savings)
//! - Error types
//! - The monthly expense reshaping used by the dashboard series
//!
//! ## Key Types
//!
//! ### Profile
//! - [`UserProfile`] - Opaque user profile with typed accessors
//!
//! ### Summaries
//! - [`MonthlyTotal`] - Sparse `{month, total}` entry from the API
//! - [`MonthlySeries`] - Dense 12-slot expense series
//! - [`CategoryTotal`] - One slice of the category breakdown
//!
//! ### Transactions & Savings
//! - [`Transaction`], [`TransactionDraft`], [`TransactionKind`]
//! - [`TransactionFilter`], [`TransactionPage`]
//! - [`SavingsPlan`], [`SavingsEntry`]

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Profile
    UserProfile,
    // Summaries
    CategoryTotal,
    MonthlySeries,
    MonthlyTotal,
    MONTHS_PER_YEAR,
    // Transactions
    KindFilter,
    Transaction,
    TransactionDraft,
    TransactionFilter,
    TransactionKind,
    TransactionPage,
    // Savings
    SavingsEntry,
    SavingsPlan,
};
