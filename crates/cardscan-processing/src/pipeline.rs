//! Card extraction pipeline: pages → binarize → OCR → raw text blocks.

use cardscan_core::{RawTextBlock, SourceKind, UploadedDocument};
use std::sync::Arc;

use crate::document::PageExtractor;
use crate::image::normalize;
use crate::ocr::{recognize_text, OcrEngine, OcrOptions};

/// Placeholder logged for a page where OCR found nothing.
pub const NO_TEXT_PLACEHOLDER: &str = "[(No text extracted, please verify card image clarity)]";

/// Card Extraction Pipeline
///
/// Pages are processed one at a time, in document order. Every page found
/// yields exactly one block, even when its text is empty.
#[derive(Clone)]
pub struct CardExtractionPipeline {
    pages: PageExtractor,
    ocr: Arc<dyn OcrEngine>,
    options: OcrOptions,
}

impl CardExtractionPipeline {
    pub fn new(pages: PageExtractor, ocr: Arc<dyn OcrEngine>, options: OcrOptions) -> Self {
        Self {
            pages,
            ocr,
            options,
        }
    }

    /// Extract one raw text block per page of a validated upload.
    pub async fn extract_document(&self, document: &UploadedDocument) -> Vec<RawTextBlock> {
        tracing::info!(
            filename = %document.filename,
            kind = ?document.kind,
            size = document.content.len(),
            "Starting card extraction"
        );
        self.extract_kind(&document.content, document.kind).await
    }

    /// Extract one raw text block per page, dispatching on the file extension.
    ///
    /// An unknown extension yields no blocks.
    pub async fn extract_cards(&self, content: &[u8], extension: &str) -> Vec<RawTextBlock> {
        match SourceKind::from_extension(extension) {
            Some(kind) => self.extract_kind(content, kind).await,
            None => {
                tracing::warn!(extension = %extension, "Unsupported extension reached the pipeline");
                Vec::new()
            }
        }
    }

    async fn extract_kind(&self, content: &[u8], kind: SourceKind) -> Vec<RawTextBlock> {
        let pages = self.pages.extract_pages(content, kind).await;
        tracing::info!(pages = pages.len(), "Pages ready for OCR");

        let mut blocks = Vec::with_capacity(pages.len());
        for (index, page) in pages.into_iter().enumerate() {
            let text = match tokio::task::spawn_blocking(move || normalize(&page)).await {
                Ok(binarized) => recognize_text(self.ocr.as_ref(), &binarized, &self.options).await,
                Err(e) => {
                    tracing::warn!(error = %e, card = index + 1, "Binarization task failed");
                    String::new()
                }
            };

            if text.trim().is_empty() {
                tracing::debug!(card = index + 1, "{}", NO_TEXT_PLACEHOLDER);
            } else {
                tracing::debug!(card = index + 1, raw_text = %text, "Extracted raw text");
            }

            blocks.push(RawTextBlock::new(index, text));
        }

        blocks
    }
}
