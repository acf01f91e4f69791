//! Pure Rust image processing backend, zero system dependencies.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` |
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Format detection goes by content, not by the caller's declared media
//! type: browsers routinely mislabel uploads, and the bytes are what we
//! have to decode. Decoding is capped by [`Limits`] so a hostile upload
//! cannot expand into unbounded memory.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ReencodeParams;
use image::imageops::FilterType;
use image::{ImageReader, Limits};
use std::io::Cursor;

/// Maximum decodable dimension per axis. A 16384x16384 RGBA image is ~1 GB
/// in memory, the upper end of what one decode may cost.
const MAX_DECODE_DIMENSION: u32 = 16_384;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a reader over in-memory bytes with format sniffing and decode limits.
fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| BackendError::DecodeFailed(format!("format detection: {e}")))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    reader.limits(limits);

    Ok(reader)
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(data)?
            .into_dimensions()
            .map_err(|e| BackendError::DecodeFailed(format!("read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn reencode(&self, data: &[u8], params: &ReencodeParams) -> Result<Vec<u8>, BackendError> {
        let img = reader(data)?
            .decode()
            .map_err(|e| BackendError::DecodeFailed(e.to_string()))?;

        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        // JPEG has no alpha channel; flatten before encoding
        let rgb = resized.into_rgb8();

        let mut out = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut out,
            params.quality.value() as u8,
        );
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::EncodeFailed(e.to_string()))?;

        Ok(out)
    }
}
