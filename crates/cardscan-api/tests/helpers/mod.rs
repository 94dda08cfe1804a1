//! Test helpers: build AppState and router with fake OCR and rasterizer.
//!
//! Run from workspace root: `cargo test -p cardscan-api`.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use cardscan_api::setup::routes;
use cardscan_api::{AppState, GoogleSync, InMemorySessionStore, SESSION_COOKIE};
use cardscan_core::{Config, ScanConfig};
use cardscan_processing::{
    CardExtractionPipeline, OcrEngine, OcrError, OcrOptions, PageError, PageExtractor,
    PageRasterizer, UploadValidator,
};
use cardscan_services::{GeminiExtractor, GoogleContactsClient, GoogleOAuth};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

/// Page count every fake PDF rasterizes to.
pub const FAKE_PDF_PAGES: u32 = 3;

/// Rasterizer that yields `FAKE_PDF_PAGES` pages whose width encodes the page number.
struct FakeRasterizer;

#[async_trait]
impl PageRasterizer for FakeRasterizer {
    async fn rasterize(&self, document: &[u8]) -> Result<Vec<DynamicImage>, PageError> {
        if !document.starts_with(b"%PDF") {
            return Err(PageError::NoPages);
        }
        Ok((1..=FAKE_PDF_PAGES)
            .map(|n| DynamicImage::ImageRgb8(RgbImage::from_pixel(n * 10, 8, Rgb([30, 30, 30]))))
            .collect())
    }
}

/// OCR engine that "reads" the page width and records how many calls overlap.
#[derive(Default)]
struct FakeOcr {
    active: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, image: &GrayImage, _options: &OcrOptions) -> Result<String, OcrError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("Card {}\n  ACME Corp\n", image.width()))
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    /// Most OCR calls ever in flight at once.
    pub ocr_peak: Arc<AtomicUsize>,
    pub _scratch: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Build the app from environment-style overrides on top of the defaults.
pub fn setup_test_app(vars: &[(&str, &str)]) -> TestApp {
    let scratch = tempfile::tempdir().expect("Failed to create scratch directory");

    let mut env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    env.insert(
        "SCRATCH_DIR".to_string(),
        scratch.path().to_string_lossy().into_owned(),
    );
    env.entry("MAX_UPLOAD_SIZE_MB".to_string())
        .or_insert_with(|| "1".to_string());

    let config = Config(Box::new(
        ScanConfig::from_lookup(|key| env.get(key).cloned()).expect("valid test config"),
    ));

    let ocr = FakeOcr::default();
    let ocr_peak = ocr.peak.clone();
    let pipeline = CardExtractionPipeline::new(
        PageExtractor::new(Arc::new(FakeRasterizer)),
        Arc::new(ocr),
        OcrOptions::default(),
    );
    let google = GoogleOAuth::from_config(&config)
        .expect("google oauth client")
        .map(|oauth| GoogleSync {
            oauth,
            contacts: GoogleContactsClient::from_config(&config).expect("people client"),
        });

    let state = Arc::new(AppState {
        extraction_slot: Semaphore::new(1),
        validator: UploadValidator::new(
            config.max_upload_size_bytes(),
            config.allowed_extensions().to_vec(),
        ),
        pipeline,
        extractor: GeminiExtractor::from_config(&config).expect("gemini client"),
        google,
        sessions: Arc::new(InMemorySessionStore::new(chrono::Duration::minutes(
            config.session_ttl_minutes(),
        ))),
        config: config.clone(),
    });

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        ocr_peak,
        _scratch: scratch,
    }
}

/// `name=value` pair of the session cookie set by a response.
pub fn session_cookie(response: &TestResponse) -> String {
    let header = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE))
        .expect("response sets the session cookie")
        .to_string();
    header
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("response has a location header")
        .to_string()
}
