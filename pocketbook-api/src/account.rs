//! Account settings.

use std::path::Path;

use pocketbook_core::UserProfile;
use pocketbook_fetch::{ApiClient, MultipartForm};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::require;
use crate::error::ApiError;
use crate::summary::SummaryFetcher;
use crate::upload::read_attachment;

const CHANGE_PASSWORD_PATH: &str = "/api/user/change-password";
const SEND_RESET_LINK_PATH: &str = "/api/user/send-password-reset-link";
const RESET_PASSWORD_PATH: &str = "/api/user/reset-password";
const SEND_EMAIL_LINK_PATH: &str = "/api/user/send-email-updation-link";
const UPDATE_EMAIL_PATH: &str = "/api/user/update-email";
const SEND_DELETION_OTP_PATH: &str = "/api/user/send-account-deletion-otp";
const DELETE_ACCOUNT_PATH: &str = "/api/user/delete-account";
const UPDATE_PROFILE_PATH: &str = "/api/user/update-profile";
const UPDATE_PROFILE_IMAGE_PATH: &str = "/api/user/update-profile-image";

/// Account management endpoints.
#[derive(Debug, Clone)]
pub struct AccountApi {
    client: ApiClient,
}

impl AccountApi {
    /// Creates the endpoint group.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Changes the password of the signed-in user.
    #[instrument(skip_all)]
    pub async fn change_password(&self, password: &str, new_password: &str) -> Result<(), ApiError> {
        require("password", password)?;
        require("new password", new_password)?;

        self.client
            .post_json(
                CHANGE_PASSWORD_PATH,
                &json!({ "password": password, "newPassword": new_password }),
            )
            .await?;
        Ok(())
    }

    /// Emails a password reset link.
    #[instrument(skip(self))]
    pub async fn send_password_reset_link(&self, email: &str) -> Result<(), ApiError> {
        require("email", email)?;
        self.client
            .post_json(SEND_RESET_LINK_PATH, &json!({ "email": email }))
            .await?;
        Ok(())
    }

    /// Sets a new password using the token from a reset link.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        require("token", token)?;
        require("new password", new_password)?;

        self.client
            .post_json(
                RESET_PASSWORD_PATH,
                &json!({ "newPassword": new_password, "token": token }),
            )
            .await?;
        Ok(())
    }

    /// Emails a link for changing the account email.
    #[instrument(skip(self))]
    pub async fn send_email_update_link(&self, email: &str) -> Result<(), ApiError> {
        require("email", email)?;
        self.client
            .post_json(SEND_EMAIL_LINK_PATH, &json!({ "email": email }))
            .await?;
        Ok(())
    }

    /// Switches the account email using the token from an update link.
    #[instrument(skip(self, token))]
    pub async fn update_email(&self, token: &str, new_email: &str) -> Result<(), ApiError> {
        require("token", token)?;
        require("email", new_email)?;

        self.client
            .post_json(UPDATE_EMAIL_PATH, &json!({ "token": token, "newEmail": new_email }))
            .await?;
        self.client.session().modify_user(|user| user.set_email(new_email));
        Ok(())
    }

    /// Emails a one-time code that authorizes account deletion.
    #[instrument(skip(self))]
    pub async fn send_account_deletion_otp(&self, email: &str) -> Result<(), ApiError> {
        require("email", email)?;
        self.client
            .post_json(SEND_DELETION_OTP_PATH, &json!({ "email": email }))
            .await?;
        Ok(())
    }

    /// Deletes the account and ends the session.
    #[instrument(skip_all)]
    pub async fn delete_account(&self, otp: &str) -> Result<(), ApiError> {
        require("otp", otp)?;

        self.client
            .post_json(DELETE_ACCOUNT_PATH, &json!({ "otp": otp.trim() }))
            .await?;
        self.client.session().clear_session();
        info!("Account deleted");
        Ok(())
    }

    /// Updates name, income and goal, then patches the cached profile.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, name: &str, income: f64, goal: f64) -> Result<(), ApiError> {
        require("name", name)?;
        if !income.is_finite() || !goal.is_finite() {
            return Err(ApiError::invalid("income and goal must be numbers"));
        }

        self.client
            .patch_json(
                UPDATE_PROFILE_PATH,
                &json!({ "name": name, "income": income, "goal": goal }),
            )
            .await?;
        self.client
            .session()
            .modify_user(|user| user.apply_profile_edit(name, income, goal));
        Ok(())
    }

    /// Uploads a new profile image and reloads the profile, whose image
    /// URL the server rewrites.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn update_profile_image(&self, path: &Path) -> Result<UserProfile, ApiError> {
        let image = read_attachment(path).await?;
        self.client
            .post_form(UPDATE_PROFILE_IMAGE_PATH, MultipartForm::new().file("image", image))
            .await?;
        info!("Profile image uploaded");
        SummaryFetcher::new(self.client.clone()).fetch_user().await
    }

    /// Resets the profile image to the default.
    #[instrument(skip(self))]
    pub async fn remove_profile_image(&self) -> Result<(), ApiError> {
        self.client
            .post_json(UPDATE_PROFILE_IMAGE_PATH, &json!({ "removeProfileImage": true }))
            .await?;
        self.client.session().modify_user(|user| user.clear_profile_image());
        Ok(())
    }
}
