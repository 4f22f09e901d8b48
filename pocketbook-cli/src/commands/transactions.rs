//! Transactions command - list, add and delete.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use pocketbook_api::SummaryRefresh;
use pocketbook_core::{KindFilter, TransactionDraft, TransactionFilter, TransactionKind};
use tracing::warn;

use super::auth::report;
use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the transactions command.
#[derive(Args)]
pub struct TransactionsArgs {
    #[command(subcommand)]
    pub action: TransactionsAction,
}

/// Transaction subcommands.
#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List one page of transactions.
    #[command(visible_alias = "ls")]
    List {
        /// Page number, starting at 1.
        #[arg(long, short, default_value = "1")]
        page: u32,

        /// Free-text search.
        #[arg(long, short, default_value = "")]
        search: String,

        /// Only income, only expenses, or all.
        #[arg(long, short, default_value = "all")]
        kind: KindFilter,

        /// Restrict to an account (repeatable).
        #[arg(long = "account", short)]
        accounts: Vec<String>,
    },

    /// Record a transaction, or update one with --id.
    Add {
        /// income or expense.
        kind: TransactionKind,

        /// Category label.
        category: String,

        /// Account label.
        account: String,

        /// Amount (positive).
        amount: f64,

        /// Date as YYYY-MM-DD (defaults to today on the server).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free-form note.
        #[arg(long, short, default_value = "")]
        description: String,

        /// Deduct the expense from the savings allocation.
        #[arg(long)]
        sync_expense: bool,

        /// Update this transaction instead of creating one.
        #[arg(long)]
        id: Option<String>,

        /// Drop the stored receipt when updating.
        #[arg(long, requires = "id", conflicts_with = "receipt")]
        remove_receipt: bool,

        /// Attach a receipt image.
        #[arg(long, value_name = "PATH")]
        receipt: Option<PathBuf>,
    },

    /// Delete a transaction.
    #[command(visible_alias = "rm")]
    Delete {
        /// Transaction id.
        id: String,
    },
}

/// Runs the transactions command.
pub async fn run(args: &TransactionsArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let result = dispatch(&ctx, &args.action, cli).await;
    ctx.persist_session();
    result
}

async fn dispatch(ctx: &AppContext, action: &TransactionsAction, cli: &Cli) -> Result<()> {
    match action {
        TransactionsAction::List {
            page,
            search,
            kind,
            accounts,
        } => {
            let filter = TransactionFilter {
                page: *page,
                search: search.clone(),
                kind: *kind,
                accounts: accounts.clone(),
            };
            let result = ctx.api.transactions().list(&filter).await?;

            match cli.format {
                OutputFormat::Text => {
                    let formatter = TextFormatter::new(!cli.no_color);
                    println!("{}", formatter.format_transactions(&result, filter.page));
                }
                OutputFormat::Json => {
                    let formatter = JsonFormatter::new(cli.pretty);
                    println!("{}", formatter.format_transactions(&result, filter.page)?);
                }
            }
            Ok(())
        }
        TransactionsAction::Add {
            kind,
            category,
            account,
            amount,
            date,
            description,
            sync_expense,
            id,
            remove_receipt,
            receipt,
        } => {
            let mut draft = TransactionDraft::new(*kind, category.as_str(), account.as_str(), *amount);
            draft.transaction_id.clone_from(id);
            draft.date = *date;
            draft.description.clone_from(description);
            draft.sync_expense = sync_expense.then_some(true);
            draft.remove_receipt = *remove_receipt;
            draft.receipt.clone_from(receipt);

            let refresh = ctx.api.transactions().upsert(&draft).await?;
            warn_if_stale(&refresh);

            let message = if id.is_some() {
                "Transaction updated"
            } else {
                "Transaction added"
            };
            report(cli, "saved", message)
        }
        TransactionsAction::Delete { id } => {
            let refresh = ctx.api.transactions().delete(id).await?;
            warn_if_stale(&refresh);
            report(cli, "deleted", &format!("Deleted transaction {id}"))
        }
    }
}

fn warn_if_stale(refresh: &SummaryRefresh) {
    if !refresh.is_complete() {
        warn!(failed = ?refresh.failed, "Saved, but the summary could not be fully refreshed");
    }
}
