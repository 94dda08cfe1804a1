//! CardScan Services Library
//!
//! Clients for the external collaborators: the Gemini structured-data
//! extractor, Google OAuth and the Google People API, plus CSV export.

pub mod export;
pub mod gemini;
pub mod google;

pub use export::{export_csv, ExportError, EXPORT_FILENAME};
pub use gemini::{Extraction, ExtractionError, FallbackReason, GeminiExtractor};
pub use google::{
    build_person, generate_state, AccessToken, GoogleContactsClient, GoogleError, GoogleOAuth,
    PersonResource,
};
