//! User-facing formatting of pipeline events and batch outcomes.
//!
//! The manager reports progress over a channel of
//! [`GalleryEvent`](crate::gallery::GalleryEvent)s; this module turns them
//! into notification lines. Formatting lives here, decoupled from the
//! pipeline, so a UI layer can render the same events its own way without
//! touching orchestration code.

use crate::gallery::{GalleryEvent, UploadReport};
use crate::reconcile::ReconcileReport;

/// One notification line per event, naming the operation that failed and
/// the file it failed for.
pub fn format_event(event: &GalleryEvent) -> String {
    match event {
        GalleryEvent::FileRejected { filename, reason } => {
            format!("{filename}: rejected ({reason})")
        }
        GalleryEvent::ImageStored {
            filename,
            path,
            transcoded,
            thumbnail,
        } => {
            let mut line = format!("{filename} -> {path}");
            if !transcoded {
                line.push_str(" (stored original)");
            }
            if !thumbnail {
                line.push_str(" (no thumbnail)");
            }
            line
        }
        GalleryEvent::ItemFailed {
            filename,
            operation,
            reason,
        } => format!("{filename}: {operation} failed ({reason})"),
        GalleryEvent::BlobDeleteFailed { path, reason } => {
            format!("{path}: blob delete failed ({reason})")
        }
        GalleryEvent::Resynced { owner } => {
            format!("{owner}: order reloaded from server after a failed save")
        }
    }
}

/// Summary block for a finished upload batch.
pub fn format_upload_report(report: &UploadReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} uploaded, {} rejected",
        report.appended.len(),
        report.rejected.len()
    )];
    for rejected in &report.rejected {
        lines.push(format!("    {}: {}", rejected.filename, rejected.error));
    }
    lines
}

/// Summary block for a reconciliation pass.
pub fn format_reconcile_report(report: &ReconcileReport) -> Vec<String> {
    if report.is_clean() {
        return vec!["gallery storage is consistent".to_string()];
    }

    let mut lines = vec![format!(
        "{} rows missing blobs, {} orphan blobs, {} gapped partitions",
        report.missing_main.len(),
        report.orphan_blobs.len(),
        report.gapped_partitions.len()
    )];
    if report.deleted_rows + report.removed_blobs + report.compacted_partitions > 0 {
        lines.push(format!(
            "    repaired: {} rows deleted, {} blobs removed, {} partitions renumbered",
            report.deleted_rows, report.removed_blobs, report.compacted_partitions
        ));
    }
    for failure in &report.repair_failures {
        lines.push(format!("    repair failed: {failure}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OwnerKey, OwnerKind};

    #[test]
    fn format_rejection_names_file_and_reason() {
        let line = format_event(&GalleryEvent::FileRejected {
            filename: "notes.pdf".into(),
            reason: "not an image: application/pdf".into(),
        });
        assert_eq!(line, "notes.pdf: rejected (not an image: application/pdf)");
    }

    #[test]
    fn format_stored_plain() {
        let line = format_event(&GalleryEvent::ImageStored {
            filename: "dawn.png".into(),
            path: "game/42/123-abcd.jpg".into(),
            transcoded: true,
            thumbnail: true,
        });
        assert_eq!(line, "dawn.png -> game/42/123-abcd.jpg");
    }

    #[test]
    fn format_stored_with_degradations() {
        let line = format_event(&GalleryEvent::ImageStored {
            filename: "dawn.png".into(),
            path: "game/42/123-abcd.png".into(),
            transcoded: false,
            thumbnail: false,
        });
        assert_eq!(
            line,
            "dawn.png -> game/42/123-abcd.png (stored original) (no thumbnail)"
        );
    }

    #[test]
    fn format_item_failure_names_operation() {
        let line = format_event(&GalleryEvent::ItemFailed {
            filename: "big.png".into(),
            operation: "upload",
            reason: "timeout".into(),
        });
        assert_eq!(line, "big.png: upload failed (timeout)");
    }

    #[test]
    fn format_resynced() {
        let line = format_event(&GalleryEvent::Resynced {
            owner: OwnerKey::new("42", OwnerKind::Game),
        });
        assert_eq!(line, "game/42: order reloaded from server after a failed save");
    }

    #[test]
    fn upload_report_lists_rejections() {
        use crate::gallery::{GalleryError, RejectedUpload};
        let report = UploadReport {
            appended: Vec::new(),
            rejected: vec![RejectedUpload {
                filename: "clip.mp4".into(),
                error: GalleryError::NotAnImage {
                    media_type: "video/mp4".into(),
                },
            }],
        };

        let lines = format_upload_report(&report);
        assert_eq!(lines[0], "0 uploaded, 1 rejected");
        assert_eq!(lines[1], "    clip.mp4: not an image: video/mp4");
    }

    #[test]
    fn reconcile_report_clean() {
        let lines = format_reconcile_report(&ReconcileReport::default());
        assert_eq!(lines, vec!["gallery storage is consistent".to_string()]);
    }

    #[test]
    fn reconcile_report_with_findings_and_repairs() {
        let report = ReconcileReport {
            orphan_blobs: vec!["game/42/stray.jpg".into()],
            removed_blobs: 1,
            ..ReconcileReport::default()
        };
        let lines = format_reconcile_report(&report);
        assert_eq!(
            lines,
            vec![
                "0 rows missing blobs, 1 orphan blobs, 0 gapped partitions".to_string(),
                "    repaired: 0 rows deleted, 1 blobs removed, 0 partitions renumbered"
                    .to_string(),
            ]
        );
    }
}
