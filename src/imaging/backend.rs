//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and reencode. Both work on in-memory byte slices;
//! uploads arrive as blobs and variants leave as blobs, so no backend ever
//! touches the filesystem.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked, no system dependencies.

use super::params::ReencodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("encode failed: {0}")]
    EncodeFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement both operations so the rest of the codebase
/// is backend-agnostic: orchestration logic runs against a deterministic
/// mock in tests and against the `image`-crate backend in production.
pub trait ImageBackend: Sync {
    /// Get pixel dimensions without a full decode where possible.
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, scale to exactly the target dimensions, and encode in the
    /// normalized output format.
    fn reencode(&self, data: &[u8], params: &ReencodeParams) -> Result<Vec<u8>, BackendError>;
}
