//! Register/login/logout against the API.
//!
//! Only the exchange of credentials for a bearer token lives here; keeping the
//! token between runs is up to the caller.

use presto_core::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::client::{check_status, transport_error, ApiConfig};

const REGISTER_PATH: &str = "admin/auth/register";
const LOGIN_PATH: &str = "admin/auth/login";
const LOGOUT_PATH: &str = "admin/auth/logout";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Client for the authentication endpoints.
pub struct AuthClient {
    config: ApiConfig,
    client: Client,
}

impl AuthClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    fn request_token(&self, path: &str, credentials: &Credentials<'_>) -> Result<String> {
        let url = self.config.url(path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(credentials)
            .send()
            .map_err(transport_error)?;
        let response = check_status(response)?;

        let body: TokenResponse = response
            .json()
            .map_err(|e| Error::Backend(format!("Invalid auth response: {}", e)))?;
        Ok(body.token)
    }

    /// Create an account and return its token.
    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<String> {
        validate_credentials(email, password)?;
        if name.trim().is_empty() {
            return Err(Error::Validation("name cannot be empty".to_string()));
        }
        self.request_token(
            REGISTER_PATH,
            &Credentials {
                email,
                password,
                name: Some(name),
            },
        )
    }

    /// Exchange credentials for a token.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        validate_credentials(email, password)?;
        self.request_token(
            LOGIN_PATH,
            &Credentials {
                email,
                password,
                name: None,
            },
        )
    }

    /// Invalidate the configured token.
    pub fn logout(&self) -> Result<()> {
        if self.config.token.is_none() {
            return Err(Error::Validation("not logged in".to_string()));
        }

        let url = self.config.url(LOGOUT_PATH);
        log::debug!("POST {}", url);

        let response = self
            .config
            .authorize(self.client.post(&url))
            .send()
            .map_err(transport_error)?;
        check_status(response)?;
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(Error::Validation(format!("invalid email: {}", email)));
    }
    if password.is_empty() {
        return Err(Error::Validation("password cannot be empty".to_string()));
    }
    Ok(())
}
