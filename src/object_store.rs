//! Durable blob storage keyed by path.
//!
//! The [`ObjectStore`] trait is the consumed slice of a hosted storage
//! service: upload, public-URL resolution, removal, and prefix listing.
//! Buckets are flat namespaces; paths are `/`-separated keys derived by
//! [`naming`](crate::naming), never user-controlled.
//!
//! Two implementations ship with the crate:
//! - [`FsObjectStore`]: a directory tree, one file per object. Useful for
//!   local development and integration tests against real encoded bytes.
//! - [`MemoryObjectStore`]: a `HashMap`, for unit tests and demos.
//!
//! Removal is tolerant by contract: removing a path that does not exist is
//! a no-op, and a multi-path remove attempts every path before reporting
//! the first hard failure. Callers treat blob removal as best-effort; the
//! reconciler sweeps up what slips through.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("upload failed for {path}: {reason}")]
    UploadFailed { path: String, reason: String },
    #[error("remove failed for {path}: {reason}")]
    RemoveFailed { path: String, reason: String },
    #[error("list failed: {0}")]
    ListFailed(String),
}

/// Consumed operations of the hosted object-storage service.
pub trait ObjectStore: Send + Sync {
    /// Store a blob under `bucket/path`, overwriting any existing object.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Resolve the public URL of an object. Pure derivation, no existence
    /// check.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects. Missing paths are no-ops; every path is attempted
    /// before the first hard failure is reported.
    fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError>;

    /// List object paths under a prefix. Consumed only by reconciliation.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// A stored blob with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// HashMap-backed store. Public URLs use the `memory://` scheme.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{bucket}/{path}")
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object, for assertions and demos.
    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&object_key(bucket, path))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&object_key(bucket, path))
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.objects.lock().unwrap().insert(
            object_key(bucket, path),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&object_key(bucket, path));
        }
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let bucket_prefix = format!("{bucket}/");
        let mut paths: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter_map(|key| key.strip_prefix(&bucket_prefix))
            .filter(|path| path.starts_with(prefix))
            .map(String::from)
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// Directory-backed store: one file per object under `root/bucket/path`.
///
/// Content types are not persisted: the filesystem has no metadata channel
/// for them, and the extension already carries the format.
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            base_url,
        }
    }

    fn object_file(&self, bucket: &str, path: &str) -> PathBuf {
        self.root.join(bucket).join(path)
    }
}

impl ObjectStore for FsObjectStore {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        let file = self.object_file(bucket, path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, data)?;
        debug!(bucket, path, content_type, bytes = data.len(), "stored object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{bucket}/{path}", self.base_url)
    }

    fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError> {
        let mut first_failure = None;
        for path in paths {
            match std::fs::remove_file(self.object_file(bucket, path)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(bucket, path, error = %e, "object remove failed");
                    first_failure.get_or_insert(StoreError::RemoveFailed {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let bucket_dir = self.root.join(bucket);
        if !bucket_dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(&bucket_dir) {
            let entry = entry.map_err(|e| StoreError::ListFailed(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&bucket_dir)
                .map_err(|e| StoreError::ListFailed(e.to_string()))?;
            let path = path_to_key(relative);
            if path.starts_with(prefix) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Render a relative filesystem path as a `/`-separated object key.
fn path_to_key(path: &Path) -> String {
    path.iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Wrapper injecting failures into a [`MemoryObjectStore`], for
    /// exercising the manager's per-item failure policies.
    #[derive(Default)]
    pub struct FlakyObjectStore {
        pub inner: MemoryObjectStore,
        /// `Some(n)`: the n-th upload from now fails (0 = the next one).
        /// One-shot; uploads after the failing one succeed again.
        pub uploads_until_failure: Mutex<Option<usize>>,
        pub fail_removes: AtomicBool,
    }

    impl FlakyObjectStore {
        pub fn failing_upload_at(n: usize) -> Self {
            Self {
                uploads_until_failure: Mutex::new(Some(n)),
                ..Self::default()
            }
        }
    }

    impl ObjectStore for FlakyObjectStore {
        fn upload(
            &self,
            bucket: &str,
            path: &str,
            data: &[u8],
            content_type: &str,
        ) -> Result<(), StoreError> {
            let mut countdown = self.uploads_until_failure.lock().unwrap();
            match countdown.take() {
                Some(0) => {
                    return Err(StoreError::UploadFailed {
                        path: path.to_string(),
                        reason: "injected failure".to_string(),
                    });
                }
                Some(n) => *countdown = Some(n - 1),
                None => {}
            }
            drop(countdown);
            self.inner.upload(bucket, path, data, content_type)
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            self.inner.public_url(bucket, path)
        }

        fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StoreError> {
            if self.fail_removes.load(Ordering::Relaxed) {
                return Err(StoreError::RemoveFailed {
                    path: paths.first().cloned().unwrap_or_default(),
                    reason: "injected failure".to_string(),
                });
            }
            self.inner.remove(bucket, paths)
        }

        fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
            self.inner.list(bucket, prefix)
        }
    }

    // =========================================================================
    // MemoryObjectStore
    // =========================================================================

    #[test]
    fn memory_upload_and_get() {
        let store = MemoryObjectStore::new();
        store
            .upload("gallery", "game/1/a.jpg", b"bytes", "image/jpeg")
            .unwrap();

        let obj = store.get("gallery", "game/1/a.jpg").unwrap();
        assert_eq!(obj.data, b"bytes");
        assert_eq!(obj.content_type, "image/jpeg");
    }

    #[test]
    fn memory_upload_overwrites() {
        let store = MemoryObjectStore::new();
        store.upload("gallery", "x", b"v1", "image/png").unwrap();
        store.upload("gallery", "x", b"v2", "image/png").unwrap();
        assert_eq!(store.get("gallery", "x").unwrap().data, b"v2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_public_url_embeds_bucket_and_path() {
        let store = MemoryObjectStore::new();
        assert_eq!(
            store.public_url("gallery", "game/1/a.jpg"),
            "memory://gallery/game/1/a.jpg"
        );
    }

    #[test]
    fn memory_remove_missing_is_ok() {
        let store = MemoryObjectStore::new();
        store.remove("gallery", &["absent".to_string()]).unwrap();
    }

    #[test]
    fn memory_remove_multiple() {
        let store = MemoryObjectStore::new();
        store.upload("gallery", "a", b"1", "image/png").unwrap();
        store.upload("gallery", "b", b"2", "image/png").unwrap();
        store
            .remove("gallery", &["a".to_string(), "b".to_string()])
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn memory_list_filters_by_bucket_and_prefix() {
        let store = MemoryObjectStore::new();
        store.upload("gallery", "game/1/a.jpg", b"", "image/jpeg").unwrap();
        store.upload("gallery", "game/1/b.jpg", b"", "image/jpeg").unwrap();
        store.upload("gallery", "game/2/c.jpg", b"", "image/jpeg").unwrap();
        store.upload("other", "game/1/d.jpg", b"", "image/jpeg").unwrap();

        assert_eq!(
            store.list("gallery", "game/1/").unwrap(),
            vec!["game/1/a.jpg".to_string(), "game/1/b.jpg".to_string()]
        );
        assert_eq!(store.list("gallery", "").unwrap().len(), 3);
    }

    // =========================================================================
    // FsObjectStore
    // =========================================================================

    #[test]
    fn fs_upload_creates_nested_file() {
        let tmp = TempDir::new().unwrap();
        let store = FsObjectStore::new(tmp.path(), "https://cdn.example/storage");

        store
            .upload("gallery", "game/42/x.jpg", b"jpeg bytes", "image/jpeg")
            .unwrap();

        let on_disk = tmp.path().join("gallery/game/42/x.jpg");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn fs_public_url_joins_base_bucket_path() {
        let store = FsObjectStore::new("/tmp/ignored", "https://cdn.example/storage/");
        assert_eq!(
            store.public_url("gallery", "game/42/x.jpg"),
            "https://cdn.example/storage/gallery/game/42/x.jpg"
        );
    }

    #[test]
    fn fs_remove_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        let store = FsObjectStore::new(tmp.path(), "file://x");
        store.remove("gallery", &["never/existed.jpg".to_string()]).unwrap();
    }

    #[test]
    fn fs_remove_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let store = FsObjectStore::new(tmp.path(), "file://x");
        store.upload("gallery", "a/b.jpg", b"data", "image/jpeg").unwrap();
        store.remove("gallery", &["a/b.jpg".to_string()]).unwrap();
        assert!(!tmp.path().join("gallery/a/b.jpg").exists());
    }

    #[test]
    fn fs_list_returns_slash_separated_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FsObjectStore::new(tmp.path(), "file://x");
        store.upload("gallery", "game/1/a.jpg", b"", "image/jpeg").unwrap();
        store.upload("gallery", "blog/2/b.jpg", b"", "image/jpeg").unwrap();

        assert_eq!(
            store.list("gallery", "").unwrap(),
            vec!["blog/2/b.jpg".to_string(), "game/1/a.jpg".to_string()]
        );
        assert_eq!(
            store.list("gallery", "game/").unwrap(),
            vec!["game/1/a.jpg".to_string()]
        );
    }

    #[test]
    fn fs_list_missing_bucket_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FsObjectStore::new(tmp.path(), "file://x");
        assert!(store.list("gallery", "").unwrap().is_empty());
    }

    // =========================================================================
    // FlakyObjectStore
    // =========================================================================

    #[test]
    fn flaky_fails_exactly_the_nth_upload() {
        let store = FlakyObjectStore::failing_upload_at(1);
        assert!(store.upload("b", "first", b"", "image/png").is_ok());
        assert!(store.upload("b", "second", b"", "image/png").is_err());
        assert!(store.upload("b", "third", b"", "image/png").is_ok());
        assert!(store.inner.contains("b", "first"));
        assert!(!store.inner.contains("b", "second"));
        assert!(store.inner.contains("b", "third"));
    }
}
