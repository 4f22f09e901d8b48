//! Watch command - live dashboard.

use std::io::{Write, stdout};

use anyhow::Result;
use clap::Args;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use super::summary::print_summary;
use super::{current_year, ensure_authorized};
use crate::Cli;
use crate::context::AppContext;

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds.
    #[arg(long, short, default_value = "60")]
    pub interval: u64,

    /// Minimum interval to use.
    #[arg(long, default_value = "10")]
    pub min_interval: u64,

    /// Year for the monthly expense series.
    #[arg(long)]
    pub year: Option<i32>,
}

/// Runs the watch command.
///
/// While rate limited the screen counts down once per second and the next
/// refresh starts as soon as the block is lifted.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let refresh_every = Duration::from_secs(args.interval.max(args.min_interval));
    let year = args.year.unwrap_or_else(current_year);

    info!(interval = refresh_every.as_secs(), year, "Starting watch mode");

    let ctx = AppContext::load(cli).await?;
    let session = ctx.api.session().clone();

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_refresh: Option<Instant> = None;

    loop {
        ticker.tick().await;

        let lifted = session.is_rate_limited() && session.acknowledge_rate_limit();
        if lifted {
            debug!("Rate limit lifted");
        }
        let due = last_refresh.is_none_or(|at| at.elapsed() >= refresh_every);
        let refreshed = lifted || (due && !session.is_rate_limited());

        if refreshed {
            ctx.api.summary().refresh_all_summary_data(year).await;
            last_refresh = Some(Instant::now());
            ctx.persist_session();
            ensure_authorized(&ctx)?;
        }

        if refreshed || session.is_rate_limited() {
            draw(&ctx, year, refresh_every, cli)?;
        }
    }
}

fn draw(ctx: &AppContext, year: i32, refresh_every: Duration, cli: &Cli) -> Result<()> {
    print!("\x1b[2J\x1b[H");
    stdout().flush()?;

    let now = chrono::Local::now();
    println!(
        "Pocketbook Watch Mode - {} (refresh: {}s)",
        now.format("%H:%M:%S"),
        refresh_every.as_secs()
    );
    println!("{}", "─".repeat(50));
    println!();

    print_summary(&ctx.api.session().snapshot(), year, cli)?;
    println!();
    println!("Press Ctrl+C to exit");
    Ok(())
}
