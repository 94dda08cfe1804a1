//! Application state shared by every handler.

use cardscan_core::Config;
use cardscan_processing::{CardExtractionPipeline, UploadValidator};
use cardscan_services::{GeminiExtractor, GoogleContactsClient, GoogleOAuth};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::session::SessionStore;

/// OAuth and People API clients, present only when Google credentials are configured.
pub struct GoogleSync {
    pub oauth: GoogleOAuth,
    pub contacts: GoogleContactsClient,
}

pub struct AppState {
    pub config: Config,
    /// Single permit: uploads run OCR and structuring one at a time, in arrival order.
    pub extraction_slot: Semaphore,
    pub validator: UploadValidator,
    pub pipeline: CardExtractionPipeline,
    pub extractor: GeminiExtractor,
    pub google: Option<GoogleSync>,
    pub sessions: Arc<dyn SessionStore>,
}
