//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what variants to produce) and the
//! [`backend`](super::backend) (which does the actual pixel work). The
//! separation allows swapping backends (e.g. for testing with a mock)
//! without changing operation logic.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Full specification of a re-encode: target dimensions and quality.
///
/// The backend scales the decoded image to exactly `width` × `height` and
/// encodes it in the normalized output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReencodeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
