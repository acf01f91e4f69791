//! Shared test utilities: synthetic image fixtures.
//!
//! Real encoded bytes for tests that drive the production backend. Kept out
//! of individual test modules because both the backend tests and the
//! end-to-end manager tests want the same fixtures.

use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

/// Encode a synthetic JPEG with the given dimensions.
pub fn make_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode a synthetic PNG with an alpha channel.
pub fn make_png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
    out
}
