//! Pipeline configuration.
//!
//! A single [`GalleryConfig`] carries every tunable of the ingestion
//! pipeline: the storage bucket, the per-file size ceiling, and the
//! dimension/quality policies of the two generated variants. Defaults match
//! the production values; a deployment overrides individual fields via a
//! TOML fragment, so a config file only mentions what it changes:
//!
//! ```toml
//! bucket = "staging-gallery"
//!
//! [thumbnail]
//! max_edge = 240
//! ```

use serde::Deserialize;

/// Per-file upload ceiling: 10 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Policy for the full-size stored variant.
///
/// Both bounds hold simultaneously: the longer axis may not exceed
/// `max_long_edge` and the shorter may not exceed `max_short_edge`. The
/// binding constraint decides the scale factor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MainVariantConfig {
    pub max_long_edge: u32,
    pub max_short_edge: u32,
    /// JPEG quality, 1-100.
    pub quality: u32,
}

impl Default for MainVariantConfig {
    fn default() -> Self {
        Self {
            max_long_edge: 1920,
            max_short_edge: 1080,
            quality: 85,
        }
    }
}

/// Policy for the thumbnail variant: a single bound on the longer axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThumbnailVariantConfig {
    pub max_edge: u32,
    /// JPEG quality, 1-100.
    pub quality: u32,
}

impl Default for ThumbnailVariantConfig {
    fn default() -> Self {
        Self {
            max_edge: 300,
            quality: 80,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Object-store bucket all variants are written to.
    pub bucket: String,
    /// Files larger than this are rejected before any processing.
    pub max_upload_bytes: u64,
    pub main: MainVariantConfig,
    pub thumbnail: ThumbnailVariantConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            bucket: "gallery".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            main: MainVariantConfig::default(),
            thumbnail: ThumbnailVariantConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Parse a TOML fragment, filling unmentioned fields with defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
