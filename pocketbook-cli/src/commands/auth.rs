//! Sign-in, registration and sign-out commands.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::context::AppContext;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Account email.
    pub email: String,

    /// Account password.
    #[arg(long, env = "POCKETBOOK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the register command.
#[derive(Args)]
pub struct RegisterArgs {
    /// Display name.
    pub name: String,

    /// Account email.
    pub email: String,

    /// Account password.
    #[arg(long, env = "POCKETBOOK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the logout command.
#[derive(Args)]
pub struct LogoutArgs {
    /// Sign out every device.
    #[arg(long)]
    pub all: bool,

    /// Password, required with --all.
    #[arg(long, env = "POCKETBOOK_PASSWORD", hide_env_values = true, required_if_eq("all", "true"))]
    pub password: Option<String>,
}

/// Signs in and keeps the session cookie.
pub async fn login(args: &LoginArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let result = ctx.api.auth().login(&args.email, &args.password).await;
    ctx.persist_session();
    result?;

    info!(email = %args.email, "Signed in");
    report(cli, "signed_in", &format!("Signed in as {}", args.email))
}

/// Creates an account and signs in.
pub async fn register(args: &RegisterArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let result = ctx
        .api
        .auth()
        .register(&args.name, &args.email, &args.password)
        .await;
    ctx.persist_session();
    result?;

    report(cli, "registered", &format!("Welcome, {}", args.name))
}

/// Signs out this device, or every device with `--all`.
pub async fn logout(args: &LogoutArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let auth = ctx.api.auth();
    let result = match (&args.password, args.all) {
        (Some(password), true) => auth.logout_all(password).await,
        _ => auth.logout().await,
    };
    ctx.persist_session();
    result?;

    let message = if args.all {
        "Signed out of all devices"
    } else {
        "Signed out"
    };
    report(cli, "signed_out", message)
}

/// Renews the access token from the saved session cookie.
pub async fn refresh(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let result = ctx.api.summary().refresh_auth_token().await;
    ctx.persist_session();
    result?;

    report(cli, "refreshed", "Session renewed")
}

/// Prints a one-line outcome in the selected format.
pub(crate) fn report(cli: &Cli, status: &str, message: &str) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{message}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = serde_json::json!({ "status": status, "message": message });
            println!("{}", formatter.format(&output)?);
        }
    }
    Ok(())
}
