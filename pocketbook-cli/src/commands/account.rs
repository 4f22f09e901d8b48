//! Account command - password, email, profile and deletion.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::auth::report;
use crate::Cli;
use crate::context::AppContext;

/// Arguments for the account command.
#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub action: AccountAction,
}

/// Account subcommands.
#[derive(Subcommand)]
pub enum AccountAction {
    /// Change the password while signed in.
    ChangePassword {
        /// Current password.
        #[arg(long, env = "POCKETBOOK_PASSWORD", hide_env_values = true)]
        password: String,

        /// New password.
        #[arg(long)]
        new_password: String,
    },

    /// Email a password reset link.
    ResetLink {
        /// Account email.
        email: String,
    },

    /// Set a new password with the token from the reset link.
    ResetPassword {
        /// Token from the reset link.
        token: String,

        /// New password.
        #[arg(long)]
        new_password: String,
    },

    /// Email a link for changing the account email.
    EmailLink {
        /// Address to send the link to.
        email: String,
    },

    /// Change the account email with the token from the email link.
    UpdateEmail {
        /// Token from the email link.
        token: String,

        /// New email address.
        new_email: String,
    },

    /// Email a one-time code for deleting the account.
    DeletionOtp {
        /// Account email.
        email: String,
    },

    /// Delete the account with the emailed code.
    Delete {
        /// One-time code.
        otp: String,
    },

    /// Update name, monthly income and savings goal.
    Profile {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Monthly income.
        #[arg(long)]
        income: f64,

        /// Monthly savings goal.
        #[arg(long)]
        goal: f64,
    },

    /// Upload a new profile image.
    Image {
        /// Image file.
        path: PathBuf,
    },

    /// Reset the profile image to the default.
    RemoveImage,
}

/// Runs the account command.
pub async fn run(args: &AccountArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let result = dispatch(&ctx, &args.action, cli).await;
    ctx.persist_session();
    result
}

async fn dispatch(ctx: &AppContext, action: &AccountAction, cli: &Cli) -> Result<()> {
    let account = ctx.api.account();

    match action {
        AccountAction::ChangePassword {
            password,
            new_password,
        } => {
            account.change_password(password, new_password).await?;
            report(cli, "password_changed", "Password changed")
        }
        AccountAction::ResetLink { email } => {
            account.send_password_reset_link(email).await?;
            report(cli, "link_sent", &format!("Reset link sent to {email}"))
        }
        AccountAction::ResetPassword {
            token,
            new_password,
        } => {
            account.reset_password(token, new_password).await?;
            report(cli, "password_reset", "Password reset, sign in with the new password")
        }
        AccountAction::EmailLink { email } => {
            account.send_email_update_link(email).await?;
            report(cli, "link_sent", &format!("Email change link sent to {email}"))
        }
        AccountAction::UpdateEmail { token, new_email } => {
            account.update_email(token, new_email).await?;
            report(cli, "email_updated", &format!("Email changed to {new_email}"))
        }
        AccountAction::DeletionOtp { email } => {
            account.send_account_deletion_otp(email).await?;
            report(cli, "otp_sent", &format!("Deletion code sent to {email}"))
        }
        AccountAction::Delete { otp } => {
            account.delete_account(otp).await?;
            report(cli, "deleted", "Account deleted")
        }
        AccountAction::Profile { name, income, goal } => {
            account.update_profile(name, *income, *goal).await?;
            report(cli, "profile_updated", "Profile updated")
        }
        AccountAction::Image { path } => {
            let user = account.update_profile_image(path).await?;
            let message = match user.profile_image() {
                Some(url) => format!("Profile image updated: {url}"),
                None => "Profile image updated".to_string(),
            };
            report(cli, "image_updated", &message)
        }
        AccountAction::RemoveImage => {
            account.remove_profile_image().await?;
            report(cli, "image_removed", "Profile image removed")
        }
    }
}
