use crate::error::{Error, Result};
use crate::storage::Storage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem-backed storage rooted at the configured uploads directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        // Keys are generated internally, but a traversal check costs nothing.
        if key.contains("..") || Path::new(key).is_absolute() {
            return Err(Error::Storage(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create upload dir: {}", e)))?;
        }
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write storage object {}: {}", key, e);
            Error::Storage(format!("Failed to store file: {}", e))
        })?;
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Storage object not found: {}", key)))
            }
            Err(e) => Err(Error::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("Failed to delete {}: {}", key, e))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(fs::try_exists(&path)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let storage = LocalStorage::new("/tmp/relocation-test-uploads");
        assert!(storage.upload("../etc/passwd", b"x").await.is_err());
        assert!(storage.download("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn roundtrip_and_idempotent_delete() {
        let root = std::env::temp_dir().join(format!("reloc-store-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&root);
        storage.upload("documents/a.txt", b"hello").await.unwrap();
        assert!(storage.exists("documents/a.txt").await.unwrap());
        assert_eq!(storage.download("documents/a.txt").await.unwrap(), b"hello");
        storage.delete("documents/a.txt").await.unwrap();
        // deleting a missing object is not an error
        storage.delete("documents/a.txt").await.unwrap();
        assert!(!storage.exists("documents/a.txt").await.unwrap());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
