//! Google contacts integration
//!
//! OAuth 2.0 authorization-code flow plus the People API `createContact` call.

pub mod contacts;
pub mod oauth;

pub use contacts::{build_person, GoogleContactsClient, PersonResource};
pub use oauth::{generate_state, AccessToken, GoogleOAuth, CONTACTS_SCOPE};

#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    #[error("Invalid Google endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to reach Google: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Google API request failed: {status} - {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid token response: {0}")]
    Token(String),
}
