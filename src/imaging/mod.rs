//! Image processing: pure Rust, zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Fallback** | degrade-not-fail: original bytes pass through |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{fit_longest_edge, fit_within_bounds};
pub use operations::{
    NORMALIZED_MEDIA_TYPE, TranscodeOutcome, TranscodePolicy, ThumbnailPolicy, get_dimensions,
    thumbnail, transcode,
};
pub use params::{Quality, ReencodeParams};
pub use rust_backend::RustBackend;
