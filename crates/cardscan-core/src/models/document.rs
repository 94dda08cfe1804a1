use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How an upload is turned into page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A single raster image holding one card.
    Image,
    /// A multi-page document, one card per page.
    Paginated,
}

impl SourceKind {
    /// Map a file extension (case-insensitive, without the dot) to its source kind.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" => Some(SourceKind::Image),
            "pdf" => Some(SourceKind::Paginated),
            _ => None,
        }
    }
}

/// One user-submitted file, owned by the request that received it.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Sanitized client filename, used for logging only.
    pub filename: String,
    /// Lowercased extension without the dot.
    pub extension: String,
    pub kind: SourceKind,
    pub content: Bytes,
}

/// OCR output for one page or card.
///
/// An empty `text` means the page was found but nothing readable was on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RawTextBlock {
    /// Zero-based page position within the upload.
    pub index: usize,
    pub text: String,
}

impl RawTextBlock {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
