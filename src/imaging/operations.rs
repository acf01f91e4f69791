//! High-level image operations.
//!
//! These functions combine calculations with backend execution, and they own
//! the degrade-not-fail policy: a decode or encode failure falls back to the
//! original bytes (transcode) or to no output at all (thumbnail) instead of
//! propagating an error. An upload never dies because one codec choked; the
//! worst case is storing the original file unoptimized, or serving it
//! without a thumbnail.

use super::backend::{Dimensions, ImageBackend};
use super::calculations::{fit_longest_edge, fit_within_bounds};
use super::params::{Quality, ReencodeParams};
use tracing::debug;

/// Media type of every successfully transcoded variant.
pub const NORMALIZED_MEDIA_TYPE: &str = "image/jpeg";

/// Bounds and quality for the full-size variant.
///
/// Both bounds hold simultaneously; the binding constraint decides the
/// scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodePolicy {
    pub max_long_edge: u32,
    pub max_short_edge: u32,
    pub quality: Quality,
}

impl Default for TranscodePolicy {
    fn default() -> Self {
        Self {
            max_long_edge: 1920,
            max_short_edge: 1080,
            quality: Quality::new(85),
        }
    }
}

/// Bound and quality for the thumbnail variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailPolicy {
    pub max_edge: u32,
    pub quality: Quality,
}

impl Default for ThumbnailPolicy {
    fn default() -> Self {
        Self {
            max_edge: 300,
            quality: Quality::new(80),
        }
    }
}

/// Result of a transcode attempt.
///
/// When `transcoded` is false the pipeline fell back to the original bytes
/// and declared media type, and the caller stores them as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeOutcome {
    pub data: Vec<u8>,
    pub media_type: String,
    pub transcoded: bool,
}

/// Produce the bounded, format-normalized full-size variant.
///
/// Decodes to pixel dimensions, fits them within the policy's dual bound
/// preserving aspect ratio, and re-encodes at the policy quality. Any
/// failure returns the input untouched (degrade-not-fail): corrupt or
/// exotically-encoded files are stored in their original form rather than
/// failing the upload.
pub fn transcode(
    backend: &impl ImageBackend,
    data: Vec<u8>,
    declared_media_type: &str,
    policy: &TranscodePolicy,
) -> TranscodeOutcome {
    let dims = match backend.identify(&data) {
        Ok(d) => d,
        Err(e) => {
            debug!(media_type = declared_media_type, error = %e, "transcode fallback: identify failed");
            return fallback(data, declared_media_type);
        }
    };

    let (width, height) = fit_within_bounds(
        (dims.width, dims.height),
        policy.max_long_edge,
        policy.max_short_edge,
    );

    match backend.reencode(
        &data,
        &ReencodeParams {
            width,
            height,
            quality: policy.quality,
        },
    ) {
        Ok(out) => TranscodeOutcome {
            data: out,
            media_type: NORMALIZED_MEDIA_TYPE.to_string(),
            transcoded: true,
        },
        Err(e) => {
            debug!(media_type = declared_media_type, error = %e, "transcode fallback: reencode failed");
            fallback(data, declared_media_type)
        }
    }
}

fn fallback(data: Vec<u8>, declared_media_type: &str) -> TranscodeOutcome {
    TranscodeOutcome {
        data,
        media_type: declared_media_type.to_string(),
        transcoded: false,
    }
}

/// Produce the thumbnail variant, or `None` when it cannot be produced.
///
/// Same scaling approach as [`transcode`] with a single bound on the longer
/// axis. The caller records an absent thumbnail and proceeds; the main
/// upload is never blocked by a thumbnail failure.
pub fn thumbnail(
    backend: &impl ImageBackend,
    data: &[u8],
    policy: &ThumbnailPolicy,
) -> Option<Vec<u8>> {
    let dims = match backend.identify(data) {
        Ok(d) => d,
        Err(e) => {
            debug!(error = %e, "thumbnail skipped: identify failed");
            return None;
        }
    };

    let (width, height) = fit_longest_edge((dims.width, dims.height), policy.max_edge);

    match backend.reencode(
        data,
        &ReencodeParams {
            width,
            height,
            quality: policy.quality,
        },
    ) {
        Ok(out) => Some(out),
        Err(e) => {
            debug!(error = %e, "thumbnail skipped: reencode failed");
            None
        }
    }
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, data: &[u8]) -> Option<Dimensions> {
    backend.identify(data).ok()
}
