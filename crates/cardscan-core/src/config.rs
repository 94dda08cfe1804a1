//! Configuration module
//!
//! Loads server, OCR, rasterizer, LLM and Google contacts settings from the
//! environment (and `.env` when present).

use std::env;
use std::path::{Path, PathBuf};

// Common constants
const PORT: u16 = 5000;
const MAX_UPLOAD_SIZE_MB: usize = 16;
const SESSION_TTL_MINUTES: i64 = 60;
/// Upper bound on session lifetime (30 days).
pub const MAX_SESSION_TTL_MINUTES: i64 = 30 * 24 * 60;
const OCR_ENGINE_MODE: u8 = 3;
const OCR_PAGE_SEG_MODE: u8 = 6;
const PDF_RASTER_DPI: u32 = 300;
const GEMINI_TIMEOUT_SECS: u64 = 30;
const GOOGLE_TIMEOUT_SECS: u64 = 30;

/// File extensions the extraction pipeline knows how to read.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent";
pub const DEFAULT_GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GOOGLE_PEOPLE_API_URL: &str = "https://people.googleapis.com/v1";

/// OAuth client registration for the contacts sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Card scanner configuration
#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_upload_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub scratch_dir: PathBuf,
    pub session_ttl_minutes: i64,
    // OCR engine
    pub tesseract_path: String,
    pub ocr_language: String,
    pub ocr_engine_mode: u8,
    pub ocr_page_seg_mode: u8,
    // Page rasterizer
    pub pdftoppm_path: String,
    pub pdf_raster_dpi: u32,
    // Structured-data extraction (absent key means degraded mode)
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_timeout_secs: u64,
    // Google contacts sync
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub google_auth_uri: String,
    pub google_token_uri: String,
    pub google_people_api_url: String,
    pub google_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ScanConfig>);

impl Config {
    fn as_scan(&self) -> &ScanConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_scan().environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ScanConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_scan().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_scan().server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_scan().environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_scan().cors_origins
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_scan().max_upload_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.as_scan().allowed_extensions
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.as_scan().scratch_dir
    }

    pub fn session_ttl_minutes(&self) -> i64 {
        self.as_scan().session_ttl_minutes
    }

    pub fn tesseract_path(&self) -> &str {
        &self.as_scan().tesseract_path
    }

    pub fn ocr_language(&self) -> &str {
        &self.as_scan().ocr_language
    }

    pub fn ocr_engine_mode(&self) -> u8 {
        self.as_scan().ocr_engine_mode
    }

    pub fn ocr_page_seg_mode(&self) -> u8 {
        self.as_scan().ocr_page_seg_mode
    }

    pub fn pdftoppm_path(&self) -> &str {
        &self.as_scan().pdftoppm_path
    }

    pub fn pdf_raster_dpi(&self) -> u32 {
        self.as_scan().pdf_raster_dpi
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.as_scan().gemini_api_key.as_deref()
    }

    pub fn gemini_api_url(&self) -> &str {
        &self.as_scan().gemini_api_url
    }

    pub fn gemini_timeout_secs(&self) -> u64 {
        self.as_scan().gemini_timeout_secs
    }

    /// Returns the OAuth client only when id, secret and redirect URI are all set.
    pub fn google_credentials(&self) -> Option<GoogleCredentials> {
        let scan = self.as_scan();
        Some(GoogleCredentials {
            client_id: scan.google_client_id.clone()?,
            client_secret: scan.google_client_secret.clone()?,
            redirect_uri: scan.google_redirect_uri.clone()?,
        })
    }

    pub fn google_auth_uri(&self) -> &str {
        &self.as_scan().google_auth_uri
    }

    pub fn google_token_uri(&self) -> &str {
        &self.as_scan().google_token_uri
    }

    pub fn google_people_api_url(&self) -> &str {
        &self.as_scan().google_people_api_url
    }

    pub fn google_timeout_secs(&self) -> u64 {
        self.as_scan().google_timeout_secs
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ScanConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);
        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?;

        let config = ScanConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            max_upload_size_bytes,
            allowed_extensions: split_list(
                &var("ALLOWED_EXTENSIONS").unwrap_or_else(|| SUPPORTED_EXTENSIONS.join(",")),
            ),
            scratch_dir: PathBuf::from(var("SCRATCH_DIR").unwrap_or_else(|| "uploads".to_string())),
            session_ttl_minutes: var("SESSION_TTL_MINUTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SESSION_TTL_MINUTES),
            tesseract_path: var("TESSERACT_PATH").unwrap_or_else(|| "tesseract".to_string()),
            ocr_language: var("OCR_LANGUAGE").unwrap_or_else(|| "eng".to_string()),
            ocr_engine_mode: var("OCR_ENGINE_MODE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(OCR_ENGINE_MODE),
            ocr_page_seg_mode: var("OCR_PAGE_SEG_MODE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(OCR_PAGE_SEG_MODE),
            pdftoppm_path: var("PDFTOPPM_PATH").unwrap_or_else(|| "pdftoppm".to_string()),
            pdf_raster_dpi: var("PDF_RASTER_DPI")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PDF_RASTER_DPI),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_api_url: var("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_timeout_secs: var("GEMINI_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(GEMINI_TIMEOUT_SECS),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            google_client_secret: var("GOOGLE_CLIENT_SECRET"),
            google_redirect_uri: var("GOOGLE_REDIRECT_URI"),
            google_auth_uri: var("GOOGLE_AUTH_URI")
                .unwrap_or_else(|| DEFAULT_GOOGLE_AUTH_URI.to_string()),
            google_token_uri: var("GOOGLE_TOKEN_URI")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URI.to_string()),
            google_people_api_url: var("GOOGLE_PEOPLE_API_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_PEOPLE_API_URL.to_string()),
            google_timeout_secs: var("GOOGLE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(GOOGLE_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if let Some(unsupported) = self
            .allowed_extensions
            .iter()
            .find(|ext| !SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS contains unsupported extension '{}' (supported: {})",
                unsupported,
                SUPPORTED_EXTENSIONS.join(", ")
            ));
        }

        if self.pdf_raster_dpi == 0 {
            return Err(anyhow::anyhow!("PDF_RASTER_DPI must be greater than 0"));
        }

        if self.session_ttl_minutes <= 0 || self.session_ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(anyhow::anyhow!(
                "SESSION_TTL_MINUTES must be between 1 and {}",
                MAX_SESSION_TTL_MINUTES
            ));
        }

        let google_keys = [
            self.google_client_id.is_some(),
            self.google_client_secret.is_some(),
            self.google_redirect_uri.is_some(),
        ];
        if google_keys.iter().any(|set| *set) && !google_keys.iter().all(|set| *set) {
            tracing::warn!(
                "Google OAuth is partially configured; set GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URI to enable contacts sync"
            );
        }

        Ok(())
    }
}
