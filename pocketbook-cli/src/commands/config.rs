//! Config command - manage configuration.

use anyhow::Result;
use clap::{ArgAction, Args, Subcommand};
use pocketbook_store::{ClientSettings, default_config_dir, default_settings_path, parse_base_url};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the API base URL.
    SetUrl {
        /// Base URL, e.g. https://api.example.com.
        url: String,
    },

    /// Set the request timeout.
    Timeout {
        /// Timeout in seconds.
        seconds: u64,
    },

    /// Keep the session in the OS keychain between runs.
    Remember {
        /// true or false.
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::SetUrl { url } => set_url(url).await,
        ConfigAction::Timeout { seconds } => set_timeout(*seconds).await,
        ConfigAction::Remember { enabled } => set_remember(*enabled).await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let settings = ClientSettings::load().await;
    let effective_url = settings.resolve_base_url(cli.api_url.as_deref())?;

    match cli.format {
        OutputFormat::Text => {
            println!("Pocketbook Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API URL:          {effective_url}");
            if let Some(configured) = &settings.api_base_url {
                println!("  (settings file: {configured})");
            }
            println!("Timeout:          {}s", settings.timeout_secs);
            println!(
                "User agent:       {}",
                settings.user_agent_suffix.as_deref().unwrap_or("(default)")
            );
            println!("Remember session: {}", settings.remember_session);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = serde_json::json!({
                "settings": settings,
                "effectiveApiUrl": effective_url.as_str(),
            });
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configDir": config_dir.display().to_string(),
                "settingsFile": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_url(raw: &str) -> Result<()> {
    let url = parse_base_url(raw)?;

    let mut settings = ClientSettings::load().await;
    settings.api_base_url = Some(url.to_string());
    settings.save().await?;

    info!(url = %url, "API URL updated");
    println!("API URL set to: {url}");
    Ok(())
}

async fn set_timeout(seconds: u64) -> Result<()> {
    if seconds == 0 {
        anyhow::bail!("Timeout must be at least 1 second");
    }

    let mut settings = ClientSettings::load().await;
    settings.timeout_secs = seconds;
    settings.save().await?;

    info!(seconds, "Timeout updated");
    println!("Timeout set to: {seconds}s");
    Ok(())
}

async fn set_remember(enabled: bool) -> Result<()> {
    let mut settings = ClientSettings::load().await;
    settings.remember_session = enabled;
    settings.save().await?;

    info!(enabled, "Remember session updated");
    if enabled {
        println!("Sessions will be kept in the OS keychain");
    } else {
        println!("Sessions will not be kept between runs");
    }
    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
