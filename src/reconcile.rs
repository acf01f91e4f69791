//! Reconciliation of metadata rows against stored blobs.
//!
//! The pipeline's multi-step operations are deliberately untransacted:
//! upload-then-insert and delete-blobs-then-delete-row can each die between
//! steps, and an abandoned browser tab can leave an uploaded blob with no
//! row at all. Those inconsistencies are tolerated at write time and swept
//! up here.
//!
//! A pass detects four findings:
//! - **Missing main blob**: a row whose full-size variant is gone. The row
//!   can never render; repair deletes it.
//! - **Missing thumbnail blob**: a row whose recorded thumbnail is gone.
//!   The main image still renders, so this is report-only.
//! - **Orphan blob**: a stored object no row references (counting each
//!   row's main path and its derived thumbnail path). Repair removes it.
//! - **Gapped partition**: `display_order` values that are not `0..N-1`
//!   (deletions leave gaps, and racing reorders can duplicate values).
//!   Repair compacts the partition in its current sort order.
//!
//! Repairs are per-item best-effort: a failed delete lands in
//! `repair_failures` and the sweep continues.

use crate::config::GalleryConfig;
use crate::metadata_store::{MetadataError, MetadataStore};
use crate::naming;
use crate::object_store::{ObjectStore, StoreError};
use crate::types::{GalleryImage, OwnerKey};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("storage: {0}")]
    Storage(#[from] StoreError),
    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Detect and report only.
    Report,
    /// Detect, then delete unrenderable rows, remove orphan blobs, and
    /// compact gapped partitions.
    Repair,
}

/// Findings of one pass, plus what repair actually did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Rows whose main blob is gone.
    pub missing_main: Vec<Uuid>,
    /// Rows whose recorded thumbnail blob is gone. Report-only.
    pub missing_thumbnails: Vec<Uuid>,
    /// Stored paths no row references.
    pub orphan_blobs: Vec<String>,
    /// Partitions whose orders are not a contiguous `0..N-1`.
    pub gapped_partitions: Vec<OwnerKey>,
    pub deleted_rows: usize,
    pub removed_blobs: usize,
    pub compacted_partitions: usize,
    /// Repair attempts that themselves failed.
    pub repair_failures: Vec<String>,
}

impl ReconcileReport {
    /// True when the sweep found nothing to reconcile.
    pub fn is_clean(&self) -> bool {
        self.missing_main.is_empty()
            && self.missing_thumbnails.is_empty()
            && self.orphan_blobs.is_empty()
            && self.gapped_partitions.is_empty()
    }
}

/// Sweep every partition, comparing rows against stored blobs.
pub fn reconcile(
    store: &impl ObjectStore,
    meta: &impl MetadataStore,
    config: &GalleryConfig,
    mode: ReconcileMode,
) -> Result<ReconcileReport, ReconcileError> {
    let bucket = &config.bucket;
    let rows = meta.select_all()?;
    let blobs: HashSet<String> = store.list(bucket, "")?.into_iter().collect();

    let mut report = ReconcileReport::default();
    let mut referenced: HashSet<String> = HashSet::new();
    let mut partitions: BTreeMap<String, (OwnerKey, Vec<GalleryImage>)> = BTreeMap::new();

    for row in &rows {
        let owner = row.owner();
        partitions
            .entry(owner.to_string())
            .or_insert_with(|| (owner, Vec::new()))
            .1
            .push(row.clone());

        let Some(main_path) = naming::path_from_url(&row.image_url, bucket) else {
            // Foreign URL: not this bucket's blob to check
            warn!(id = %row.id, url = %row.image_url, "row references a foreign url");
            continue;
        };
        let thumb_path = naming::thumbnail_path(&main_path);
        referenced.insert(main_path.clone());
        referenced.insert(thumb_path.clone());

        if !blobs.contains(&main_path) {
            report.missing_main.push(row.id);
        }
        if row.thumbnail_url.is_some() && !blobs.contains(&thumb_path) {
            report.missing_thumbnails.push(row.id);
        }
    }

    report.orphan_blobs = {
        let mut orphans: Vec<String> = blobs
            .iter()
            .filter(|path| !referenced.contains(*path))
            .cloned()
            .collect();
        orphans.sort();
        orphans
    };

    for (owner, partition_rows) in partitions.values() {
        if !is_contiguous(partition_rows) {
            report.gapped_partitions.push(owner.clone());
        }
    }

    if !report.is_clean() {
        info!(
            missing_main = report.missing_main.len(),
            missing_thumbnails = report.missing_thumbnails.len(),
            orphan_blobs = report.orphan_blobs.len(),
            gapped_partitions = report.gapped_partitions.len(),
            "reconciliation findings"
        );
    }

    if mode == ReconcileMode::Repair {
        repair(store, meta, bucket, &partitions, &mut report);
    }

    Ok(report)
}

fn repair(
    store: &impl ObjectStore,
    meta: &impl MetadataStore,
    bucket: &str,
    partitions: &BTreeMap<String, (OwnerKey, Vec<GalleryImage>)>,
    report: &mut ReconcileReport,
) {
    let unrenderable = report.missing_main.clone();
    for id in unrenderable {
        match meta.delete(id) {
            Ok(()) => report.deleted_rows += 1,
            Err(e) => report
                .repair_failures
                .push(format!("delete row {id}: {e}")),
        }
    }

    if !report.orphan_blobs.is_empty() {
        match store.remove(bucket, &report.orphan_blobs) {
            Ok(()) => report.removed_blobs = report.orphan_blobs.len(),
            Err(e) => report.repair_failures.push(format!("remove orphans: {e}")),
        }
    }

    // Deleting unrenderable rows may itself open gaps, so compaction works
    // from a fresh read of any partition that was gapped or lost a row
    let touched: HashSet<String> = partitions
        .values()
        .filter(|(_, rows)| {
            rows.iter()
                .any(|row| report.missing_main.contains(&row.id))
        })
        .map(|(owner, _)| owner.to_string())
        .collect();

    for (owner, _) in partitions.values() {
        let needs_check =
            report.gapped_partitions.contains(owner) || touched.contains(&owner.to_string());
        if !needs_check {
            continue;
        }
        match compact_partition(meta, owner) {
            Ok(true) => report.compacted_partitions += 1,
            Ok(false) => {}
            Err(e) => report
                .repair_failures
                .push(format!("compact {owner}: {e}")),
        }
    }
}

/// Renumber a partition `0..N-1` in its current sort order. Returns whether
/// anything changed.
fn compact_partition(
    meta: &impl MetadataStore,
    owner: &OwnerKey,
) -> Result<bool, MetadataError> {
    let rows = meta.select_partition(owner)?;
    let mut changed = false;
    for (index, row) in rows.iter().enumerate() {
        let order = index as u32;
        if row.display_order != order {
            meta.update_order(row.id, order)?;
            changed = true;
        }
    }
    Ok(changed)
}

fn is_contiguous(rows: &[GalleryImage]) -> bool {
    let mut orders: Vec<u32> = rows.iter().map(|row| row.display_order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == index as u32)
}
