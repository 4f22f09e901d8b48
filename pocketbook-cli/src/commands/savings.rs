//! Savings command - show or edit the allocation.

use anyhow::Result;
use clap::{Args, Subcommand};
use pocketbook_core::{SavingsPlan, UserProfile};

use super::auth::report;
use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the savings command.
#[derive(Args)]
pub struct SavingsArgs {
    /// Subcommand (defaults to show).
    #[command(subcommand)]
    pub action: Option<SavingsAction>,
}

/// Savings subcommands.
#[derive(Subcommand)]
pub enum SavingsAction {
    /// Show the current allocation.
    Show,

    /// Set the amount saved with one method.
    Set {
        /// Bucket, e.g. bank or investments.
        bucket: String,

        /// Method within the bucket, e.g. FD.
        method: String,

        /// Amount allocated.
        amount: f64,
    },
}

/// Runs the savings command.
pub async fn run(args: &SavingsArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let result = dispatch(&ctx, args.action.as_ref().unwrap_or(&SavingsAction::Show), cli).await;
    ctx.persist_session();
    result
}

async fn dispatch(ctx: &AppContext, action: &SavingsAction, cli: &Cli) -> Result<()> {
    let user = ctx.api.summary().fetch_user().await?;
    let mut plan = user.savings().unwrap_or_default();

    match action {
        SavingsAction::Show => print_plan(&plan, cli),
        SavingsAction::Set {
            bucket,
            method,
            amount,
        } => {
            plan.set_amount(bucket, method, *amount);
            ctx.api.savings().upsert_savings(&plan).await?;

            let saved = ctx
                .api
                .session()
                .user()
                .as_ref()
                .and_then(UserProfile::savings)
                .unwrap_or(plan);
            match cli.format {
                OutputFormat::Text => report(cli, "saved", &format!("Saved {bucket}/{method}")),
                OutputFormat::Json => print_plan(&saved, cli),
            }
        }
    }
}

fn print_plan(plan: &SavingsPlan, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_savings(plan));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = serde_json::json!({
                "total": plan.total(),
                "savings": plan,
            });
            println!("{}", formatter.format(&output)?);
        }
    }
    Ok(())
}
