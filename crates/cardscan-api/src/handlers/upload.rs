use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use cardscan_core::{AppError, ContactRecord};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub card_count: usize,
    /// One record per page or image, in document order.
    pub cards: Vec<ContactRecord>,
}

/// Upload business cards
///
/// Runs OCR over every page of the uploaded image or PDF and structures each
/// card's text into a contact record. Cards are processed one at a time, in
/// page order, and only one upload is processed at a time. The result is also
/// kept in the session for the next `GET /`.
///
/// # Errors
/// - `AppError::InvalidInput` - No `file` field, empty filename or empty body
/// - `AppError::UnsupportedFileType` - Extension outside the allowlist
/// - `AppError::PayloadTooLarge` - Body exceeds the upload cap
#[utoipa::path(
    post,
    path = "/upload",
    tag = "cards",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Cards extracted", body = UploadResponse),
        (status = 400, description = "Upload rejected", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, multipart), fields(operation = "upload_cards"))]
pub async fn upload_cards(
    State(state): State<Arc<AppState>>,
    mut session: Session,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (filename, content) = extract_multipart_file(multipart).await?;
    let document = state.validator.validate_document(&filename, content)?;

    let cards = {
        let _slot = state
            .extraction_slot
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Extraction slot closed: {}", e)))?;

        let blocks = state.pipeline.extract_document(&document).await;

        let mut cards = Vec::with_capacity(blocks.len());
        for block in &blocks {
            cards.push(state.extractor.extract_contact(&block.text).await);
        }
        cards
    };

    tracing::info!(
        filename = %document.filename,
        cards = cards.len(),
        "Successfully structured contacts"
    );

    session.data.processed_cards = Some(cards.clone());
    let cookie = session.save(&state).await?;

    Ok((
        cookie,
        Json(UploadResponse {
            card_count: cards.len(),
            cards,
        }),
    ))
}

/// Extract the filename and bytes of the single multipart field named `file`.
async fn extract_multipart_file(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, data));
    }

    upload.ok_or_else(|| AppError::InvalidInput("No file part".to_string()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}
