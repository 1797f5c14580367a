//! Upload blob storage
//!
//! Uploads land under a root directory, one subdirectory per scope (the
//! owner's id, or a shared guests directory). The store deals in opaque
//! bytes; naming and type checks happen before anything reaches it.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

/// Subdirectory for uploads that have no owning user
pub const GUEST_SCOPE: &str = "guests";

/// Where upload bytes go once admitted
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `scope/name` and return the absolute path written
    async fn put(&self, scope: &str, name: &str, data: &[u8]) -> io::Result<PathBuf>;
}

/// Filesystem-backed blob store
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, scope: &str, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let dir = self.root.join(scope);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "stored upload blob");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_bytes_under_scope() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let path = store.put("guests", "a.wav", b"RIFF").await.unwrap();
        assert_eq!(path, dir.path().join("guests").join("a.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn put_creates_missing_scope_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("uploads"));

        let scope = uuid::Uuid::new_v4().to_string();
        let path = store.put(&scope, "b.mp3", b"ID3").await.unwrap();
        assert!(path.exists());
        assert!(path.starts_with(dir.path().join("uploads").join(&scope)));
    }

    #[tokio::test]
    async fn puts_into_same_scope_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let first = store.put("guests", "one.wav", b"1").await.unwrap();
        let second = store.put("guests", "two.wav", b"2").await.unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }
}
