//! Sign-in and sign-out.

use pocketbook_fetch::ApiClient;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::error::ApiError;

const LOGIN_PATH: &str = "/api/user/login";
const REGISTER_PATH: &str = "/api/user/register";
const LOGOUT_PATH: &str = "/api/user/logout";
const LOGOUT_ALL_PATH: &str = "/api/user/logout-all";

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Authentication endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    /// Creates the endpoint group.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Signs in and stores the access token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        require("email", email)?;
        require("password", password)?;

        let response = self
            .client
            .post_json(LOGIN_PATH, &json!({ "email": email, "password": password }))
            .await?;
        let token: String = response.field(LOGIN_PATH, "accessToken")?;
        self.client.session().set_token(token.clone());
        info!("Signed in");
        Ok(token)
    }

    /// Creates an account and stores the access token.
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<String, ApiError> {
        require("name", name)?;
        require("email", email)?;
        require("password", password)?;

        let body = Registration {
            name,
            email,
            password,
        };
        let response = self.client.post_json(REGISTER_PATH, &body).await?;
        let token: String = response.field(REGISTER_PATH, "accessToken")?;
        self.client.session().set_token(token.clone());
        info!("Account registered");
        Ok(token)
    }

    /// Signs out this device.
    ///
    /// The local session is cleared whether or not the server call worked.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.client.post_json(LOGOUT_PATH, &json!({})).await;
        self.client.session().clear_session();
        result?;
        info!("Signed out");
        Ok(())
    }

    /// Signs out every device. Needs the current password.
    #[instrument(skip(self, password))]
    pub async fn logout_all(&self, password: &str) -> Result<(), ApiError> {
        require("password", password)?;

        self.client
            .post_json(LOGOUT_ALL_PATH, &json!({ "password": password }))
            .await?;
        self.client.session().clear_session();
        info!("Signed out of all devices");
        Ok(())
    }
}

/// Rejects blank required input.
pub(crate) fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("email", "a@b.c").is_ok());
        let err = require("password", "   ").unwrap_err();
        assert!(err.to_string().contains("password is required"));
    }
}
