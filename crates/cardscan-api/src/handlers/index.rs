use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use cardscan_core::ContactRecord;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct IndexResponse {
    /// Cards from the last upload, if not shown yet.
    pub cards: Option<Vec<ContactRecord>>,
    /// Status line from the last sync attempt, if not shown yet.
    pub status_message: Option<String>,
}

/// Show pending results
///
/// Returns the last processed cards and status message once; both are cleared
/// from the session by this call.
#[utoipa::path(
    get,
    path = "/",
    tag = "cards",
    responses(
        (status = 200, description = "Pending cards and status", body = IndexResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn index(
    State(state): State<Arc<AppState>>,
    mut session: Session,
) -> Result<impl IntoResponse, HttpAppError> {
    let cards = session.data.processed_cards.take();
    let status_message = session.data.status_message.take();
    let cookie = session.save(&state).await?;

    Ok((
        cookie,
        Json(IndexResponse {
            cards,
            status_message,
        }),
    ))
}
