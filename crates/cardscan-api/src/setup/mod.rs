//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::session::InMemorySessionStore;
use crate::state::{AppState, GoogleSync};
use anyhow::{Context, Result};
use cardscan_core::Config;
use cardscan_processing::{
    CardExtractionPipeline, OcrOptions, PageExtractor, PdftoppmRasterizer, TesseractEngine,
    UploadValidator,
};
use cardscan_services::{GeminiExtractor, GoogleContactsClient, GoogleOAuth};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let state = build_state(&config).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Build the shared state: tesseract + pdftoppm pipeline, Gemini extractor,
/// optional Google clients and the in-memory session store.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>> {
    tokio::fs::create_dir_all(config.scratch_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create scratch directory {}",
                config.scratch_dir().display()
            )
        })?;

    let rasterizer = Arc::new(PdftoppmRasterizer::new(
        config.pdftoppm_path(),
        config.pdf_raster_dpi(),
        config.scratch_dir(),
    ));
    let ocr = Arc::new(TesseractEngine::new(
        config.tesseract_path(),
        config.scratch_dir(),
    ));
    let options = OcrOptions {
        language: config.ocr_language().to_string(),
        engine_mode: config.ocr_engine_mode(),
        page_seg_mode: config.ocr_page_seg_mode(),
    };
    let pipeline = CardExtractionPipeline::new(PageExtractor::new(rasterizer), ocr, options);

    let extractor = GeminiExtractor::from_config(config)?;
    if !extractor.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set; extracted cards will carry raw text only");
    }

    let google = match GoogleOAuth::from_config(config)? {
        Some(oauth) => Some(GoogleSync {
            oauth,
            contacts: GoogleContactsClient::from_config(config)?,
        }),
        None => {
            tracing::warn!("Google OAuth credentials missing; contacts sync is disabled");
            None
        }
    };

    let validator = UploadValidator::new(
        config.max_upload_size_bytes(),
        config.allowed_extensions().to_vec(),
    );
    let sessions = Arc::new(InMemorySessionStore::new(chrono::Duration::minutes(
        config.session_ttl_minutes(),
    )));

    Ok(Arc::new(AppState {
        config: config.clone(),
        extraction_slot: Semaphore::new(1),
        validator,
        pipeline,
        extractor,
        google,
        sessions,
    }))
}
