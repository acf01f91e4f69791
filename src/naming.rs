//! Storage path and URL derivation.
//!
//! Every stored variant lives under a deterministic, collision-resistant
//! path:
//!
//! ```text
//! {owner_kind}/{owner_id}/{timestamp_millis}-{token}.{ext}       main variant
//! {owner_kind}/{owner_id}/{timestamp_millis}-{token}-thumb.{ext} thumbnail
//! ```
//!
//! The thumbnail path is derived from the main path by suffix insertion
//! before the extension, never stored independently: given a main URL the
//! thumbnail location is always recoverable, which is what delete and
//! reconciliation rely on.

use crate::types::OwnerKey;
use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};

/// Suffix inserted before the extension for the thumbnail variant.
pub const THUMB_SUFFIX: &str = "-thumb";

/// Length of the random token in a storage path.
const TOKEN_LEN: usize = 8;

/// True when a declared media type names an image.
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// File extension for a declared image media type.
///
/// Unknown image subtypes get a generic `img` extension rather than an
/// error: the bytes are stored either way and the extension only feeds path
/// derivation.
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => "img",
    }
}

/// Random alphanumeric token for collision resistance within a millisecond.
pub fn random_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Derive the storage path for a main variant.
pub fn object_path(owner: &OwnerKey, at: DateTime<Utc>, token: &str, ext: &str) -> String {
    format!(
        "{}/{}/{}-{}.{}",
        owner.kind,
        owner.id,
        at.timestamp_millis(),
        token,
        ext
    )
}

/// Derive the thumbnail path from a main path by inserting [`THUMB_SUFFIX`]
/// before the extension. A path with no extension gets the suffix appended.
pub fn thumbnail_path(main_path: &str) -> String {
    match main_path.rfind('.') {
        Some(dot) if dot > main_path.rfind('/').map_or(0, |s| s + 1) => {
            format!("{}{}{}", &main_path[..dot], THUMB_SUFFIX, &main_path[dot..])
        }
        _ => format!("{main_path}{THUMB_SUFFIX}"),
    }
}

/// Recover the storage path from a public URL.
///
/// Public URLs embed the bucket as a path segment; everything after the
/// first `/{bucket}/` is the object path. Returns `None` when the URL does
/// not reference the bucket.
pub fn path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{bucket}/");
    url.find(&marker)
        .map(|pos| url[pos + marker.len()..].to_string())
        .filter(|path| !path.is_empty())
}

/// Prefix shared by every object in one owner partition.
pub fn partition_prefix(owner: &OwnerKey) -> String {
    format!("{}/{}/", owner.kind, owner.id)
}
