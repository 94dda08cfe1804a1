//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::error;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use cardscan_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Room for multipart boundaries and part headers on top of the file cap.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// In-flight request cap. Card extraction itself is serialized by
/// `AppState::extraction_slot`; this bounds the requests waiting for it.
const HTTP_CONCURRENCY_LIMIT: usize = 64;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/", get(handlers::index::index))
        .route("/upload", post(handlers::upload::upload_cards))
        .route("/export", post(handlers::export::export_contacts))
        .route("/sync/google", post(handlers::sync::start_google_sync))
        .route("/oauth2callback", get(handlers::sync::oauth_callback))
        .route("/health", get(handlers::health::liveness_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(RequestBodyLimitLayer::new(
            config
                .max_upload_size_bytes()
                .saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(axum::middleware::from_fn_with_state(
            !config.is_production(),
            error::error_detail_scope,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
