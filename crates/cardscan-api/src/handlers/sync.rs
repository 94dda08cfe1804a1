//! Google contacts sync: start the OAuth round trip, then create the contacts
//! on the callback.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use cardscan_core::{AppError, ContactRecord};
use cardscan_services::generate_state;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::session::{Session, SessionData};
use crate::state::AppState;

pub const NO_CONTACTS_MESSAGE: &str = "Error: No contacts selected for sync.";
pub const CREDENTIALS_MISSING_MESSAGE: &str =
    "Error: Google Sync credentials missing from server configuration.";
pub const NOT_CONFIGURED_ERROR: &str = "Server not configured for Google Sync.";
pub const INVALID_STATE_MESSAGE: &str =
    "Error: Invalid state parameter during OAuth flow (possible CSRF attempt).";
pub const MISSING_CODE_MESSAGE: &str = "Error: Google did not return an authorization code.";
pub const TOKEN_FAILED_MESSAGE: &str = "Error: Could not complete Google authorization.";

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncRedirectResponse {
    /// Google consent screen the browser should navigate to.
    pub redirect: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    /// Anti-forgery token echoed back by Google
    pub state: Option<String>,
    /// Authorization code
    pub code: Option<String>,
    /// Error reported by Google when the user denies access
    pub error: Option<String>,
}

/// Start Google contacts sync
///
/// Stores the contacts in the session and returns the Google consent URL.
#[utoipa::path(
    post,
    path = "/sync/google",
    tag = "sync",
    request_body = Vec<ContactRecord>,
    responses(
        (status = 200, description = "Authorization URL", body = SyncRedirectResponse),
        (status = 303, description = "No contacts given; status stored and redirected to /"),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Google sync not configured", body = ErrorResponse)
    )
)]
pub async fn start_google_sync(
    State(state): State<Arc<AppState>>,
    mut session: Session,
    ValidatedJson(contacts): ValidatedJson<Vec<ContactRecord>>,
) -> Result<Response, HttpAppError> {
    if contacts.is_empty() {
        session.data.status_message = Some(NO_CONTACTS_MESSAGE.to_string());
        let cookie = session.save(&state).await?;
        return Ok((cookie, Redirect::to("/")).into_response());
    }

    let contact_count = contacts.len();
    session.data.contacts_to_sync = contacts;

    let Some(google) = state.google.as_ref() else {
        session.data.status_message = Some(CREDENTIALS_MISSING_MESSAGE.to_string());
        let cookie = session.save(&state).await?;
        let error = HttpAppError(AppError::NotConfigured(NOT_CONFIGURED_ERROR.to_string()));
        return Ok((cookie, error).into_response());
    };

    let oauth_state = generate_state();
    let authorization_url = google
        .oauth
        .authorization_url(&oauth_state)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    session.data.oauth_state = Some(oauth_state);
    let cookie = session.save(&state).await?;

    tracing::info!(contacts = contact_count, "Redirecting to Google for authorization");

    Ok((
        cookie,
        Json(SyncRedirectResponse {
            redirect: authorization_url.to_string(),
        }),
    )
        .into_response())
}

/// Google OAuth callback
///
/// Verifies the state, exchanges the code and creates every pending contact.
/// The outcome is stored as the session status; the browser always goes back to `/`.
#[utoipa::path(
    get,
    path = "/oauth2callback",
    tag = "sync",
    params(OAuthCallbackQuery),
    responses(
        (status = 303, description = "Outcome stored in the session status; redirected to /"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    mut session: Session,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let message = complete_sync(&state, &mut session.data, query).await;
    session.data.status_message = Some(message);
    let cookie = session.save(&state).await?;
    Ok((cookie, Redirect::to("/")))
}

async fn complete_sync(state: &AppState, data: &mut SessionData, query: OAuthCallbackQuery) -> String {
    if !state_matches(data.oauth_state.as_deref(), query.state.as_deref()) {
        tracing::warn!("OAuth state mismatch on callback");
        return INVALID_STATE_MESSAGE.to_string();
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        tracing::warn!(error = ?query.error, "OAuth callback without authorization code");
        return MISSING_CODE_MESSAGE.to_string();
    };

    let Some(google) = state.google.as_ref() else {
        return CREDENTIALS_MISSING_MESSAGE.to_string();
    };

    data.oauth_state = None;

    let token = match google.oauth.exchange_code(&code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to exchange Google authorization code");
            return TOKEN_FAILED_MESSAGE.to_string();
        }
    };

    let contacts = std::mem::take(&mut data.contacts_to_sync);
    let (synced, failed) = google.contacts.sync_contacts(&token, &contacts).await;

    format!(
        "Successfully synced {} contacts to Google. ({} failed).",
        synced, failed
    )
}

fn state_matches(expected: Option<&str>, received: Option<&str>) -> bool {
    match (expected, received) {
        (Some(expected), Some(received)) => expected.as_bytes().ct_eq(received.as_bytes()).into(),
        _ => false,
    }
}
