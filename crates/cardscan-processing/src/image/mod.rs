//! Image module
//!
//! Decoding of uploaded card images and the binarization applied before OCR.

pub mod normalizer;

pub use normalizer::{decode_image, normalize, BINARIZE_THRESHOLD};
