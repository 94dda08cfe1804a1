//! Domain models

pub mod contact;
pub mod document;

pub use contact::{
    normalize_whitespace, ContactRecord, ExtractionField, EXPORT_COLUMNS, EXTRACTION_SCHEMA,
};
pub use document::{RawTextBlock, SourceKind, UploadedDocument};
