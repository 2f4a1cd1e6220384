//! Local disk storage for uploaded files.
//!
//! Files live under the configured `UPLOAD_DIR`; the database only stores the
//! key (a `/`-separated path relative to that root).

use anyhow::{Context, Result, bail};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if absent.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.root.display()))
    }

    /// Key for a member photo: `members/<member_id>/<uuid>.<ext>`.
    pub fn member_photo_key(member_id: Uuid, extension: &str) -> String {
        format!("members/{member_id}/{}.{extension}", Uuid::new_v4())
    }

    /// Write `data` under `key`, creating parent directories. Returns the key.
    pub async fn put_object(&self, key: &str, data: &[u8]) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write {key}"))?;

        tracing::debug!(key, bytes = data.len(), "Stored upload");
        Ok(key.to_string())
    }

    /// Delete the file behind `key`. A missing file is not an error.
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {key}")),
        }
    }

    /// Map a key to a path inside the root, rejecting anything that escapes it.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        if key.is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Invalid storage key: {key}");
        }
        Ok(self.root.join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let member_id = Uuid::now_v7();

        let key = LocalStorage::member_photo_key(member_id, "png");
        assert!(key.starts_with(&format!("members/{member_id}/")));
        assert!(key.ends_with(".png"));

        storage.put_object(&key, b"\x89PNG").await.unwrap();
        let written = tokio::fs::read(dir.path().join(&key)).await.unwrap();
        assert_eq!(written, b"\x89PNG");

        storage.delete_object(&key).await.unwrap();
        assert!(!dir.path().join(&key).exists());
        // Deleting twice is fine.
        storage.delete_object(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_escaping_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.put_object("../outside.txt", b"x").await.is_err());
        assert!(storage.put_object("/etc/passwd", b"x").await.is_err());
        assert!(storage.put_object("", b"x").await.is_err());
    }
}
