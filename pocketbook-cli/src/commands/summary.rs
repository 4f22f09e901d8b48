//! Summary command - the dashboard.

use anyhow::{Result, bail};
use clap::Args;
use pocketbook_store::SessionState;
use tracing::{info, warn};

use super::{current_year, ensure_authorized};
use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the summary command.
#[derive(Args, Default)]
pub struct SummaryArgs {
    /// Year for the monthly expense series (defaults to the current year).
    #[arg(long)]
    pub year: Option<i32>,
}

/// Runs the summary command.
pub async fn run(args: &SummaryArgs, cli: &Cli) -> Result<()> {
    let year = args.year.unwrap_or_else(current_year);
    info!(year, "Running summary");

    let ctx = AppContext::load(cli).await?;
    let report = ctx.api.summary().refresh_all_summary_data(year).await;
    ctx.persist_session();
    ensure_authorized(&ctx)?;

    let state = ctx.api.session().snapshot();
    if report.failed.len() == 3 && !state.is_rate_limited {
        match &state.last_error {
            Some(message) => bail!("Failed to load summary: {message}"),
            None => bail!("Failed to load summary"),
        }
    }
    if !report.is_complete() {
        warn!(failed = ?report.failed, "Summary is incomplete");
    }

    print_summary(&state, year, cli)
}

/// Renders the cached dashboard in the selected format.
pub(crate) fn print_summary(state: &SessionState, year: i32, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_summary(state, year));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_summary(state, year)?);
        }
    }
    Ok(())
}
