use image::{DynamicImage, GrayImage, ImageReader, ImageResult, Luma};
use std::io::Cursor;

/// Luminance at or above this value becomes white, everything else black.
pub const BINARIZE_THRESHOLD: u8 = 128;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// Decode image bytes, guessing the format from the content.
pub fn decode_image(data: &[u8]) -> ImageResult<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    reader.decode()
}

/// Convert to single-channel luminance and binarize with a fixed threshold.
///
/// The output has the input's dimensions and only ever holds the values 0 and 255.
pub fn normalize(image: &DynamicImage) -> GrayImage {
    let mut gray = image.to_luma8();
    for Luma([value]) in gray.pixels_mut() {
        *value = if *value >= BINARIZE_THRESHOLD { WHITE } else { BLACK };
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::HashSet;

    fn create_gradient_image(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            Rgba([r, g, 128, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        create_gradient_image(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_normalize_is_two_valued() {
        let normalized = normalize(&create_gradient_image(64, 48));
        let values: HashSet<u8> = normalized.pixels().map(|p| p.0[0]).collect();
        assert!(values.iter().all(|v| *v == BLACK || *v == WHITE));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_normalize_keeps_dimensions() {
        let normalized = normalize(&create_gradient_image(37, 11));
        assert_eq!(normalized.dimensions(), (37, 11));
    }

    #[test]
    fn test_threshold_boundary() {
        let img = GrayImage::from_raw(3, 1, vec![127, 128, 200]).unwrap();
        let normalized = normalize(&DynamicImage::ImageLuma8(img));
        assert_eq!(normalized.into_raw(), vec![BLACK, WHITE, WHITE]);
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_image(&create_test_png(20, 10)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
