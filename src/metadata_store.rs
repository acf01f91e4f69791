//! Relational metadata for gallery images.
//!
//! The [`MetadataStore`] trait is the consumed slice of the hosted row
//! store: partition-scoped select plus per-row insert, update, and delete
//! over [`GalleryImage`] rows. Each call is individually atomic; there is
//! no multi-row transaction, which is exactly the contract the hosted
//! backend offers and the reason the manager's reorder has a resync path
//! instead of a rollback.
//!
//! [`MemoryMetadataStore`] is the in-process implementation used by tests
//! and demos. Hosted transports live outside this crate; any type
//! implementing the trait plugs in.

use crate::types::{GalleryImage, NewGalleryImage, OwnerKey};
use chrono::Utc;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("row not found: {0}")]
    NotFound(Uuid),
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Consumed operations of the hosted metadata store.
pub trait MetadataStore: Send + Sync {
    /// All rows of one owner partition, sorted ascending by `display_order`.
    fn select_partition(&self, owner: &OwnerKey) -> Result<Vec<GalleryImage>, MetadataError>;

    /// Every row in the table. Consumed only by reconciliation.
    fn select_all(&self) -> Result<Vec<GalleryImage>, MetadataError>;

    /// Insert a row; the store assigns `id` and `created_at`. Ids are never
    /// reused.
    fn insert(&self, row: NewGalleryImage) -> Result<GalleryImage, MetadataError>;

    /// Persist a new `display_order` for one row.
    fn update_order(&self, id: Uuid, display_order: u32) -> Result<(), MetadataError>;

    /// Persist the two text fields for one row. Order and URLs untouched.
    fn update_text(&self, id: Uuid, alt_text: &str, caption: &str) -> Result<(), MetadataError>;

    /// Delete a row. Deleting an absent row is a no-op (the filter matched
    /// zero rows), matching hosted row-store semantics.
    fn delete(&self, id: Uuid) -> Result<(), MetadataError>;
}

/// Vec-backed store for tests and demos.
#[derive(Default)]
pub struct MemoryMetadataStore {
    rows: Mutex<Vec<GalleryImage>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn select_partition(&self, owner: &OwnerKey) -> Result<Vec<GalleryImage>, MetadataError> {
        let mut rows: Vec<GalleryImage> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.owner_id == owner.id && row.owner_kind == owner.kind)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.display_order, row.created_at));
        Ok(rows)
    }

    fn select_all(&self) -> Result<Vec<GalleryImage>, MetadataError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    fn insert(&self, row: NewGalleryImage) -> Result<GalleryImage, MetadataError> {
        let inserted = GalleryImage {
            id: Uuid::new_v4(),
            owner_id: row.owner_id,
            owner_kind: row.owner_kind,
            image_url: row.image_url,
            thumbnail_url: row.thumbnail_url,
            alt_text: row.alt_text,
            caption: row.caption,
            display_order: row.display_order,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(inserted.clone());
        Ok(inserted)
    }

    fn update_order(&self, id: Uuid, display_order: u32) -> Result<(), MetadataError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(MetadataError::NotFound(id))?;
        row.display_order = display_order;
        Ok(())
    }

    fn update_text(&self, id: Uuid, alt_text: &str, caption: &str) -> Result<(), MetadataError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(MetadataError::NotFound(id))?;
        row.alt_text = alt_text.to_string();
        row.caption = caption.to_string();
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), MetadataError> {
        self.rows.lock().unwrap().retain(|row| row.id != id);
        Ok(())
    }
}
