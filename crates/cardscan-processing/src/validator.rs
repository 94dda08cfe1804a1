use bytes::Bytes;
use cardscan_core::{SourceKind, UploadedDocument};
use std::path::Path;

/// Reasons an upload is rejected before it reaches the extraction pipeline
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Missing file extension: {0}")]
    MissingExtension(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Upload validator
///
/// Checks the client filename and body size against the configured allowlist
/// and cap, and decides how the file will be split into pages.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the filename's extension and return it lowercased.
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::InvalidFilename(
                "No file selected".to_string(),
            ));
        }

        // Text after the last dot, so ".png" counts as a png upload.
        let extension = filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ValidationError::MissingExtension(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Validate filename and size, returning how the file will be paged.
    pub fn validate(&self, filename: &str, size: usize) -> Result<SourceKind, ValidationError> {
        let extension = self.validate_extension(filename)?;
        self.validate_file_size(size)?;

        SourceKind::from_extension(&extension).ok_or_else(|| ValidationError::InvalidExtension {
            extension,
            allowed: self.allowed_extensions.clone(),
        })
    }

    /// Validate an upload and wrap it as an `UploadedDocument`.
    pub fn validate_document(
        &self,
        filename: &str,
        content: Bytes,
    ) -> Result<UploadedDocument, ValidationError> {
        let kind = self.validate(filename, content.len())?;
        let extension = self.validate_extension(filename)?;

        Ok(UploadedDocument {
            filename: sanitize_filename(filename),
            extension,
            kind,
            content,
        })
    }
}

/// Sanitize a client filename for logging: basename only, unsafe characters replaced.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UploadValidator {
        UploadValidator::new(
            1024,
            vec![
                "png".to_string(),
                "JPG".to_string(),
                "jpeg".to_string(),
                "pdf".to_string(),
            ],
        )
    }

    #[test]
    fn test_accepts_supported_types() {
        let v = validator();
        assert_eq!(v.validate("card.png", 10).unwrap(), SourceKind::Image);
        assert_eq!(v.validate("card.JPG", 10).unwrap(), SourceKind::Image);
        assert_eq!(v.validate("cards.pdf", 10).unwrap(), SourceKind::Paginated);
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        match validator().validate("card.gif", 10) {
            Err(ValidationError::InvalidExtension { extension, allowed }) => {
                assert_eq!(extension, "gif");
                assert!(allowed.contains(&"jpg".to_string()));
            }
            other => panic!("Expected InvalidExtension, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_extension_and_empty_name() {
        assert!(matches!(
            validator().validate("README", 10),
            Err(ValidationError::MissingExtension(_))
        ));
        assert!(matches!(
            validator().validate("", 10),
            Err(ValidationError::InvalidFilename(_))
        ));
        assert!(matches!(
            validator().validate("card.", 10),
            Err(ValidationError::MissingExtension(_))
        ));
    }

    #[test]
    fn test_extension_is_text_after_last_dot() {
        assert_eq!(validator().validate(".png", 10).unwrap(), SourceKind::Image);
        assert_eq!(
            validator().validate("scan.v2.PDF", 10).unwrap(),
            SourceKind::Paginated
        );
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(matches!(
            validator().validate("card.png", 0),
            Err(ValidationError::EmptyFile)
        ));
        assert!(matches!(
            validator().validate("card.png", 2048),
            Err(ValidationError::FileTooLarge {
                size: 2048,
                max: 1024
            })
        ));
    }

    #[test]
    fn test_validate_document_sanitizes_filename() {
        let doc = validator()
            .validate_document("../../etc/My Card.PNG", Bytes::from_static(b"png-bytes"))
            .unwrap();
        assert_eq!(doc.filename, "My_Card.PNG");
        assert_eq!(doc.extension, "png");
        assert_eq!(doc.kind, SourceKind::Image);
        assert_eq!(doc.content.len(), 9);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("scan 01.pdf"), "scan_01.pdf");
        assert_eq!(sanitize_filename("a"), "file");
        assert_eq!(sanitize_filename("/tmp/x..y.png"), "invalid_filename");
    }
}
