pub mod local;

use crate::error::Result;
use async_trait::async_trait;

/// Object storage seam for document files. Keys are relative paths of the
/// form `documents/{uuid}.{ext}`; the backend owns how they map to real
/// locations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn download(&self, key: &str) -> Result<Vec<u8>>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
}
