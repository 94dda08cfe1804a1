//! Document paging
//!
//! Splits an upload into page images: single images pass through, paginated
//! documents are rasterized page by page.

pub mod pages;

pub use pages::{pdftoppm_args, PageError, PageExtractor, PageRasterizer, PdftoppmRasterizer};
