//! OCR engine adapter
//!
//! `OcrEngine` is the seam to the text-recognition binary. Callers go through
//! [`recognize_text`], which turns any engine failure into "no text".

pub mod tesseract;

use async_trait::async_trait;
use image::GrayImage;
use std::process::ExitStatus;

pub use tesseract::{tesseract_args, TesseractEngine};

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Failed to stage OCR input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode OCR input: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("OCR task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Engine configuration: language hint, engine mode and page segmentation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    pub language: String,
    pub engine_mode: u8,
    pub page_seg_mode: u8,
}

impl Default for OcrOptions {
    /// English, default LSTM engine, single uniform block of text.
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            engine_mode: 3,
            page_seg_mode: 6,
        }
    }
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text on one binarized page. Empty output is valid.
    async fn recognize(&self, image: &GrayImage, options: &OcrOptions) -> Result<String, OcrError>;
}

/// Run the engine on one page; failures are logged and read as empty text.
pub async fn recognize_text(
    engine: &dyn OcrEngine,
    image: &GrayImage,
    options: &OcrOptions,
) -> String {
    match engine.recognize(image, options).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, language = %options.language, "OCR failed, treating page as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine;

    #[async_trait]
    impl OcrEngine for EchoEngine {
        async fn recognize(
            &self,
            image: &GrayImage,
            options: &OcrOptions,
        ) -> Result<String, OcrError> {
            Ok(format!("{}x{} {}", image.width(), image.height(), options.language))
        }
    }

    struct BrokenEngine;

    #[async_trait]
    impl OcrEngine for BrokenEngine {
        async fn recognize(
            &self,
            _image: &GrayImage,
            _options: &OcrOptions,
        ) -> Result<String, OcrError> {
            Err(OcrError::Spawn {
                binary: "tesseract".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            })
        }
    }

    #[tokio::test]
    async fn test_recognize_text_passes_through() {
        let text = recognize_text(&EchoEngine, &GrayImage::new(4, 2), &OcrOptions::default()).await;
        assert_eq!(text, "4x2 eng");
    }

    #[tokio::test]
    async fn test_recognize_text_swallows_failures() {
        let text =
            recognize_text(&BrokenEngine, &GrayImage::new(4, 2), &OcrOptions::default()).await;
        assert_eq!(text, "");
    }

    #[test]
    fn test_default_options() {
        let options = OcrOptions::default();
        assert_eq!(options.language, "eng");
        assert_eq!(options.engine_mode, 3);
        assert_eq!(options.page_seg_mode, 6);
    }
}
