//! Gallery orchestration: the contract exposed to the UI layer.
//!
//! [`GalleryManager`] drives the whole ingestion pipeline for one image set:
//! validate → transcode → thumbnail → upload both variants → insert the
//! metadata row, plus reordering, text edits, and deletion. It holds no lock
//! over the stores; each insert/update/delete is atomic on its own, and the
//! recovery paths (per-item batch continuation, reorder resync) exist
//! precisely because no multi-row transaction spans an operation.
//!
//! ## Batch policy
//!
//! `upload_images` treats every file independently: a validation failure, a
//! storage failure, or a metadata failure loses that file alone and the
//! batch moves on. A file that fails after its blobs were uploaded leaves
//! orphans behind; the [`reconcile`](crate::reconcile) pass sweeps those up.
//!
//! ## Local cache
//!
//! The manager keeps a per-partition cache of the ordered list, bumped by a
//! generation counter on every mutation. When a reorder persist fails
//! midway, the authoritative order is re-fetched, but only applied if the
//! local generation still matches the one captured at call time, so a slow
//! resync can never stomp a newer local edit.
//!
//! ## Progress events
//!
//! Per-file outcomes that must reach the user (rejections, item failures)
//! are sent over an optional channel as [`GalleryEvent`]s;
//! [`output::format_event`](crate::output::format_event) renders them.

use crate::config::GalleryConfig;
use crate::imaging::{
    ImageBackend, NORMALIZED_MEDIA_TYPE, Quality, ThumbnailPolicy, TranscodePolicy, thumbnail,
    transcode,
};
use crate::metadata_store::{MetadataError, MetadataStore};
use crate::naming;
use crate::object_store::{ObjectStore, StoreError};
use crate::types::{GalleryImage, NewGalleryImage, OwnerKey};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("not an image: {media_type}")]
    NotAnImage { media_type: String },
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
    #[error("index {index} out of bounds for {len} images")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("storage: {0}")]
    Storage(#[from] StoreError),
    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),
}

/// One file handed to `upload_images`: the browser-supplied name, the
/// declared media type, and the raw bytes.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }
}

/// Per-file failure within a batch.
#[derive(Debug)]
pub struct RejectedUpload {
    pub filename: String,
    pub error: GalleryError,
}

/// Outcome of an upload batch: what got appended, what didn't and why.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub appended: Vec<GalleryImage>,
    pub rejected: Vec<RejectedUpload>,
}

/// Progress notifications for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    FileRejected {
        filename: String,
        reason: String,
    },
    ImageStored {
        filename: String,
        path: String,
        transcoded: bool,
        thumbnail: bool,
    },
    /// One file's upload or metadata insert failed; the batch continued.
    ItemFailed {
        filename: String,
        operation: &'static str,
        reason: String,
    },
    /// Best-effort blob removal failed during delete. The metadata row is
    /// still removed.
    BlobDeleteFailed {
        path: String,
        reason: String,
    },
    /// A reorder persist failed midway and the partition was re-fetched.
    Resynced {
        owner: OwnerKey,
    },
}

#[derive(Debug, Default, Clone)]
struct CachedPartition {
    generation: u64,
    images: Vec<GalleryImage>,
}

/// Orchestrates uploads, ordering, edits, and deletion for gallery image
/// sets. Generic over the object store, the metadata store, and the image
/// backend so tests run against fakes and production wires in real
/// collaborators.
pub struct GalleryManager<S, M, B> {
    store: S,
    meta: M,
    backend: B,
    config: GalleryConfig,
    cache: HashMap<OwnerKey, CachedPartition>,
    events: Option<Sender<GalleryEvent>>,
}

impl<S, M, B> GalleryManager<S, M, B>
where
    S: ObjectStore,
    M: MetadataStore,
    B: ImageBackend,
{
    pub fn new(store: S, meta: M, backend: B, config: GalleryConfig) -> Self {
        Self {
            store,
            meta,
            backend,
            config,
            cache: HashMap::new(),
            events: None,
        }
    }

    /// Attach a progress-event channel.
    pub fn with_events(mut self, events: Sender<GalleryEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn object_store(&self) -> &S {
        &self.store
    }

    pub fn metadata_store(&self) -> &M {
        &self.meta
    }

    /// The locally cached ordered list for a partition, if one exists.
    /// Reads nothing from the network.
    pub fn cached(&self, owner: &OwnerKey) -> Option<&[GalleryImage]> {
        self.cache.get(owner).map(|p| p.images.as_slice())
    }

    /// Fetch the partition's rows sorted by display order, refreshing the
    /// local cache.
    pub fn list_images(&mut self, owner: &OwnerKey) -> Result<Vec<GalleryImage>, GalleryError> {
        self.refresh(owner)
    }

    /// Ingest a batch of files, one at a time in input order.
    ///
    /// Each file is independent: rejections and item failures are reported
    /// in the returned [`UploadReport`] (and on the event channel) while the
    /// rest of the batch proceeds. Appended rows get contiguous
    /// `display_order` values continuing from the current partition size.
    ///
    /// Only a failure to read the partition itself fails the whole call:
    /// without the current size there is no correct order to assign.
    pub fn upload_images(
        &mut self,
        owner: &OwnerKey,
        files: Vec<UploadFile>,
    ) -> Result<UploadReport, GalleryError> {
        let existing = self.refresh(owner)?;
        let mut next_order = existing.len() as u32;
        let mut report = UploadReport::default();

        for file in files {
            match self.ingest_one(owner, file, next_order) {
                Ok(image) => {
                    next_order += 1;
                    report.appended.push(image);
                }
                Err(rejected) => report.rejected.push(rejected),
            }
        }

        if !report.appended.is_empty() {
            let entry = self.cache.entry(owner.clone()).or_default();
            entry.images.extend(report.appended.iter().cloned());
            entry.generation += 1;
        }

        Ok(report)
    }

    /// Remove one image: best-effort blob removal first, metadata second.
    ///
    /// Blob removal failures are reported as events and never block the
    /// metadata delete: a missing row matters to the UI, a leaked blob is
    /// the reconciler's problem. If the metadata delete itself fails after
    /// the blobs are gone, the error is surfaced and the list keeps a
    /// now-broken reference until resolved.
    pub fn delete_image(&mut self, id: Uuid, image_url: &str) -> Result<(), GalleryError> {
        let bucket = self.config.bucket.clone();
        match naming::path_from_url(image_url, &bucket) {
            Some(main_path) => {
                let paths = vec![main_path.clone(), naming::thumbnail_path(&main_path)];
                if let Err(e) = self.store.remove(&bucket, &paths) {
                    warn!(path = %main_path, error = %e, "blob removal failed; deleting row anyway");
                    self.emit(GalleryEvent::BlobDeleteFailed {
                        path: main_path,
                        reason: e.to_string(),
                    });
                }
            }
            None => {
                warn!(url = image_url, "url does not reference the bucket; skipping blob removal");
            }
        }

        self.meta.delete(id)?;

        for partition in self.cache.values_mut() {
            if partition.images.iter().any(|img| img.id == id) {
                partition.images.retain(|img| img.id != id);
                partition.generation += 1;
            }
        }
        Ok(())
    }

    /// Move the image at `from_index` to `to_index` (standard array move:
    /// everything between shifts by one), renumber the partition `0..N-1`,
    /// and persist each changed row individually.
    ///
    /// A persist failure midway aborts the reorder: the authoritative order
    /// is re-fetched (generation-guarded) and the error returned. There is
    /// no transaction; last write wins.
    pub fn reorder(
        &mut self,
        owner: &OwnerKey,
        from_index: usize,
        to_index: usize,
    ) -> Result<Vec<GalleryImage>, GalleryError> {
        let (generation_at_call, mut images) = match self.cache.get(owner) {
            Some(p) => (p.generation, p.images.clone()),
            None => {
                let images = self.refresh(owner)?;
                (self.generation(owner), images)
            }
        };

        let len = images.len();
        if from_index >= len {
            return Err(GalleryError::IndexOutOfBounds {
                index: from_index,
                len,
            });
        }
        if to_index >= len {
            return Err(GalleryError::IndexOutOfBounds {
                index: to_index,
                len,
            });
        }

        let moved = images.remove(from_index);
        images.insert(to_index, moved);

        for (index, image) in images.iter_mut().enumerate() {
            let order = index as u32;
            if image.display_order == order {
                continue;
            }
            if let Err(e) = self.meta.update_order(image.id, order) {
                warn!(owner = %owner, error = %e, "reorder persist failed; resyncing");
                self.resync_if_unchanged(owner, generation_at_call);
                return Err(e.into());
            }
            image.display_order = order;
        }

        let entry = self.cache.entry(owner.clone()).or_default();
        entry.images = images.clone();
        entry.generation += 1;
        Ok(images)
    }

    /// Persist the two text fields. Order and URLs untouched; calling twice
    /// with the same values is a no-op persist.
    pub fn update_metadata(
        &mut self,
        id: Uuid,
        alt_text: &str,
        caption: &str,
    ) -> Result<(), GalleryError> {
        self.meta.update_text(id, alt_text, caption)?;

        for partition in self.cache.values_mut() {
            if let Some(image) = partition.images.iter_mut().find(|img| img.id == id) {
                if image.alt_text != alt_text || image.caption != caption {
                    image.alt_text = alt_text.to_string();
                    image.caption = caption.to_string();
                    partition.generation += 1;
                }
            }
        }
        Ok(())
    }

    // --- internals ---

    /// Pipeline for a single file. Any failure loses this file only.
    fn ingest_one(
        &self,
        owner: &OwnerKey,
        file: UploadFile,
        display_order: u32,
    ) -> Result<GalleryImage, RejectedUpload> {
        if let Err(error) = self.validate(&file) {
            self.emit(GalleryEvent::FileRejected {
                filename: file.name.clone(),
                reason: error.to_string(),
            });
            return Err(RejectedUpload {
                filename: file.name,
                error,
            });
        }

        let outcome = transcode(
            &self.backend,
            file.data,
            &file.media_type,
            &self.transcode_policy(),
        );
        let thumb = thumbnail(&self.backend, &outcome.data, &self.thumbnail_policy());

        let bucket = &self.config.bucket;
        let ext = naming::extension_for_media_type(&outcome.media_type);
        let path = naming::object_path(owner, Utc::now(), &naming::random_token(), ext);

        if let Err(e) = self
            .store
            .upload(bucket, &path, &outcome.data, &outcome.media_type)
        {
            self.emit(GalleryEvent::ItemFailed {
                filename: file.name.clone(),
                operation: "upload",
                reason: e.to_string(),
            });
            return Err(RejectedUpload {
                filename: file.name,
                error: e.into(),
            });
        }

        let thumbnail_url = match thumb {
            Some(bytes) => {
                let thumb_path = naming::thumbnail_path(&path);
                match self
                    .store
                    .upload(bucket, &thumb_path, &bytes, NORMALIZED_MEDIA_TYPE)
                {
                    Ok(()) => Some(self.store.public_url(bucket, &thumb_path)),
                    Err(e) => {
                        // Thumbnail loss is not worth losing the upload
                        warn!(path = %thumb_path, error = %e, "thumbnail upload failed");
                        None
                    }
                }
            }
            None => None,
        };

        let row = NewGalleryImage {
            owner_id: owner.id.clone(),
            owner_kind: owner.kind,
            image_url: self.store.public_url(bucket, &path),
            thumbnail_url,
            alt_text: String::new(),
            caption: String::new(),
            display_order,
        };

        match self.meta.insert(row) {
            Ok(image) => {
                self.emit(GalleryEvent::ImageStored {
                    filename: file.name,
                    path,
                    transcoded: outcome.transcoded,
                    thumbnail: image.thumbnail_url.is_some(),
                });
                Ok(image)
            }
            Err(e) => {
                // The blobs are already up with no row pointing at them;
                // reconciliation owns that cleanup
                warn!(path = %path, error = %e, "metadata insert failed; blobs orphaned");
                self.emit(GalleryEvent::ItemFailed {
                    filename: file.name.clone(),
                    operation: "metadata insert",
                    reason: e.to_string(),
                });
                Err(RejectedUpload {
                    filename: file.name,
                    error: e.into(),
                })
            }
        }
    }

    fn validate(&self, file: &UploadFile) -> Result<(), GalleryError> {
        if !naming::is_image_media_type(&file.media_type) {
            return Err(GalleryError::NotAnImage {
                media_type: file.media_type.clone(),
            });
        }
        let size = file.data.len() as u64;
        if size > self.config.max_upload_bytes {
            return Err(GalleryError::TooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }
        Ok(())
    }

    fn transcode_policy(&self) -> TranscodePolicy {
        TranscodePolicy {
            max_long_edge: self.config.main.max_long_edge,
            max_short_edge: self.config.main.max_short_edge,
            quality: Quality::new(self.config.main.quality),
        }
    }

    fn thumbnail_policy(&self) -> ThumbnailPolicy {
        ThumbnailPolicy {
            max_edge: self.config.thumbnail.max_edge,
            quality: Quality::new(self.config.thumbnail.quality),
        }
    }

    fn generation(&self, owner: &OwnerKey) -> u64 {
        self.cache.get(owner).map_or(0, |p| p.generation)
    }

    fn refresh(&mut self, owner: &OwnerKey) -> Result<Vec<GalleryImage>, GalleryError> {
        let images = self.meta.select_partition(owner)?;
        let entry = self.cache.entry(owner.clone()).or_default();
        entry.images = images.clone();
        entry.generation += 1;
        Ok(images)
    }

    /// Reload the partition from the store unless a newer local mutation
    /// happened since `observed_generation` was captured.
    fn resync_if_unchanged(&mut self, owner: &OwnerKey, observed_generation: u64) {
        if self.generation(owner) != observed_generation {
            debug!(owner = %owner, "skipping resync: local state is newer");
            return;
        }
        match self.meta.select_partition(owner) {
            Ok(images) => {
                let entry = self.cache.entry(owner.clone()).or_default();
                entry.images = images;
                entry.generation += 1;
                self.emit(GalleryEvent::Resynced {
                    owner: owner.clone(),
                });
            }
            Err(e) => warn!(owner = %owner, error = %e, "resync fetch failed"),
        }
    }

    fn emit(&self, event: GalleryEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver is not this pipeline's problem
            let _ = events.send(event);
        }
    }
}
