//! CardScan Processing Library
//!
//! Turns an uploaded card image or PDF into an ordered list of raw OCR text
//! blocks: upload validation, page rasterization, binarization and OCR.

pub mod document;
pub mod image;
pub mod ocr;
pub mod pipeline;
pub mod validator;

pub use document::{PageError, PageExtractor, PageRasterizer, PdftoppmRasterizer};
pub use self::image::{decode_image, normalize};
pub use ocr::{recognize_text, OcrEngine, OcrError, OcrOptions, TesseractEngine};
pub use pipeline::CardExtractionPipeline;
pub use validator::{sanitize_filename, UploadValidator, ValidationError};
