use anyhow::{Context, Result};
use cardscan_core::{Config, GoogleCredentials};
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use super::GoogleError;

/// Scope requested for contact creation.
pub const CONTACTS_SCOPE: &str = "https://www.googleapis.com/auth/contacts";

/// Token endpoint response. Only `access_token` is required.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Fresh hex-encoded anti-forgery token for one authorization round trip.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Google OAuth 2.0 web-server flow client
pub struct GoogleOAuth {
    http_client: reqwest::Client,
    credentials: GoogleCredentials,
    auth_uri: String,
    token_uri: String,
}

impl Debug for GoogleOAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GoogleOAuth")
            .field("client_id", &self.credentials.client_id)
            .field("redirect_uri", &self.credentials.redirect_uri)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl GoogleOAuth {
    pub fn new(
        credentials: GoogleCredentials,
        auth_uri: impl Into<String>,
        token_uri: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Google OAuth")?;

        Ok(Self {
            http_client,
            credentials,
            auth_uri: auth_uri.into(),
            token_uri: token_uri.into(),
        })
    }

    /// Build the client when all three Google credentials are configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        config
            .google_credentials()
            .map(|credentials| {
                Self::new(
                    credentials,
                    config.google_auth_uri(),
                    config.google_token_uri(),
                    Duration::from_secs(config.google_timeout_secs()),
                )
            })
            .transpose()
    }

    /// Consent-screen URL the user is redirected to.
    pub fn authorization_url(&self, state: &str) -> Result<Url, GoogleError> {
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("scope", CONTACTS_SCOPE),
                ("state", state),
                ("access_type", "offline"),
                ("include_granted_scopes", "true"),
            ],
        )
        .map_err(|e| GoogleError::InvalidEndpoint(format!("{}: {}", self.auth_uri, e)))
    }

    /// Exchange an authorization code for an access token. Single attempt.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, GoogleError> {
        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GoogleError::Status { status, body });
        }

        let body = response.text().await?;
        let token: AccessToken =
            serde_json::from_str(&body).map_err(|e| GoogleError::Token(e.to_string()))?;

        tracing::debug!(
            expires_in = ?token.expires_in,
            has_refresh_token = token.refresh_token.is_some(),
            "Exchanged Google authorization code"
        );

        Ok(token)
    }
}
