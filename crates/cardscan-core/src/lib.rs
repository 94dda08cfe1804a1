//! CardScan Core Library
//!
//! This crate provides the domain models, extraction schema, error types and
//! configuration shared by every CardScan component.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, GoogleCredentials, ScanConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ContactRecord, RawTextBlock, SourceKind, UploadedDocument};
