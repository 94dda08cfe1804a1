//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use cardscan_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CardScan API",
        version = "0.1.0",
        description = "Business card digitization: OCR over uploaded images and PDFs, LLM-structured contact fields, CSV export and Google contacts sync."
    ),
    paths(
        // Cards
        handlers::index::index,
        handlers::upload::upload_cards,
        handlers::export::export_contacts,
        // Sync
        handlers::sync::start_google_sync,
        handlers::sync::oauth_callback,
        // Health
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::ContactRecord,
            models::RawTextBlock,
            models::SourceKind,
            handlers::index::IndexResponse,
            handlers::upload::UploadResponse,
            handlers::sync::SyncRedirectResponse,
            handlers::health::LivenessResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "cards", description = "Card upload, pending results and CSV export"),
        (name = "sync", description = "Google contacts sync via OAuth"),
        (name = "health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;
