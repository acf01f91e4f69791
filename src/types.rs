//! Shared row types for gallery metadata.
//!
//! These types are serialized as JSON rows against the hosted metadata store
//! and must stay identical across the manager, the store implementations, and
//! the reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The kind of content item a gallery image belongs to.
///
/// Together with the owner id this forms the owner partition key: all images
/// attached to one game, program, or blog post live in one partition and are
/// ordered within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Game,
    Program,
    Blog,
}

impl OwnerKind {
    /// Path segment used when deriving storage paths (`game/`, `program/`, `blog/`).
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Game => "game",
            OwnerKind::Program => "program",
            OwnerKind::Blog => "blog",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner partition key: the (id, kind) pair an image set hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerKey {
    pub id: String,
    pub kind: OwnerKind,
}

impl OwnerKey {
    pub fn new(id: impl Into<String>, kind: OwnerKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// One stored image attached to a content item.
///
/// `display_order` is zero-based and unique within the owner partition; after
/// any successful insert or reorder the partition's orders form a contiguous
/// `0..N-1` permutation. Deletion may leave a gap until the next reorder (or
/// a reconciliation pass) closes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Assigned by the metadata store on insert. Never reused.
    pub id: Uuid,
    pub owner_id: String,
    pub owner_kind: OwnerKind,
    /// Public URL of the full-size stored variant.
    pub image_url: String,
    /// Public URL of the thumbnail variant. Absent when thumbnail creation
    /// failed; the main image is still served.
    pub thumbnail_url: Option<String>,
    /// Accessibility description. May be empty.
    pub alt_text: String,
    /// Display text. May be empty.
    pub caption: String,
    pub display_order: u32,
    /// Assigned by the metadata store on insert. Immutable.
    pub created_at: DateTime<Utc>,
}

impl GalleryImage {
    pub fn owner(&self) -> OwnerKey {
        OwnerKey::new(self.owner_id.clone(), self.owner_kind)
    }
}

/// Insert payload for a new gallery image row.
///
/// The store assigns `id` and `created_at`; everything else is caller-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGalleryImage {
    pub owner_id: String,
    pub owner_kind: OwnerKind,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub alt_text: String,
    pub caption: String,
    pub display_order: u32,
}
