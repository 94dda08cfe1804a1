//! Test fixtures generated in memory.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// PNG card: dark text band on a light background.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([15, 15, 15])
        } else {
            Rgb([235, 235, 235])
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode test png");
    bytes
}

/// Stand-in PDF body; the fake rasterizer never parses it.
pub fn create_test_pdf() -> Vec<u8> {
    b"%PDF-1.4\n%fake three page document\n%%EOF\n".to_vec()
}

pub fn gemini_candidate(payload: serde_json::Value) -> String {
    serde_json::json!({
        "candidates": [
            {"content": {"parts": [{"text": payload.to_string()}], "role": "model"}}
        ]
    })
    .to_string()
}
