// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Pocketbook CLI - personal finance tracking from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Sign in (the refresh cookie is kept in the OS keychain)
//! pocketbook login asha@example.com --password '...'
//!
//! # Dashboard for the current year
//! pocketbook summary
//!
//! # JSON output
//! pocketbook summary --year 2024 --format json --pretty
//!
//! # Record an expense
//! pocketbook tx add expense Groceries Cash 42.50 --description "weekly shop"
//!
//! # Live dashboard
//! pocketbook watch --interval 60
//! ```

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pocketbook_api::ApiError;
use pocketbook_fetch::FetchError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{account, auth, config, savings, summary, transactions, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Pocketbook CLI - personal finance tracking.
#[derive(Parser)]
#[command(name = "pocketbook")]
#[command(about = "Personal finance tracker CLI")]
#[command(long_about = r#"
Pocketbook tracks income, expenses and savings against a Pocketbook server.

Expired access tokens are renewed automatically from the session cookie,
which is kept in the OS keychain unless `remember_session` is turned off.

Examples:
  pocketbook login me@example.com   # Sign in
  pocketbook summary                # Dashboard for this year
  pocketbook tx list --kind expense # Recent expenses
  pocketbook watch                  # Live dashboard
"#)]
#[command(version)]
#[command(author = "Pocketbook Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'summary' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// API base URL (overrides POCKETBOOK_API_URL and the settings file).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password.
    Login(auth::LoginArgs),

    /// Create an account.
    Register(auth::RegisterArgs),

    /// Sign out.
    Logout(auth::LogoutArgs),

    /// Renew the access token from the saved session.
    Refresh,

    /// Show the dashboard summary (default if no command specified).
    #[command(visible_alias = "s")]
    Summary(summary::SummaryArgs),

    /// List, add or delete transactions.
    #[command(visible_alias = "tx")]
    Transactions(transactions::TransactionsArgs),

    /// Manage password, email, profile and account deletion.
    Account(account::AccountArgs),

    /// Show or edit the savings allocation.
    Savings(savings::SavingsArgs),

    /// Keep the dashboard on screen, refreshing periodically.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The session expired and could not be renewed.
    SessionExpired = 2,
    /// The server is rate limiting this client.
    RateLimited = 3,
    /// Timeout.
    Timeout = 4,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    pub fn for_error(error: &anyhow::Error) -> Self {
        let fetch = error
            .downcast_ref::<ApiError>()
            .and_then(ApiError::fetch_error)
            .or_else(|| error.downcast_ref::<FetchError>());

        match fetch {
            Some(e) if e.is_session_terminal() => ExitCode::SessionExpired,
            Some(e) if e.is_rate_limited() => ExitCode::RateLimited,
            Some(e) if e.is_timeout() => ExitCode::Timeout,
            _ => ExitCode::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pocketbook=debug,info")
        } else {
            EnvFilter::new("pocketbook=warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Login(args)) => auth::login(args, &cli).await,
        Some(Commands::Register(args)) => auth::register(args, &cli).await,
        Some(Commands::Logout(args)) => auth::logout(args, &cli).await,
        Some(Commands::Refresh) => auth::refresh(&cli).await,
        Some(Commands::Summary(args)) => summary::run(args, &cli).await,
        Some(Commands::Transactions(args)) => transactions::run(args, &cli).await,
        Some(Commands::Account(args)) => account::run(args, &cli).await,
        Some(Commands::Savings(args)) => savings::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => summary::run(&summary::SummaryArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
            if let Some(api) = e.downcast_ref::<ApiError>() {
                for (field, message) in api.field_errors() {
                    eprintln!("  {field}: {message}");
                }
            }
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
