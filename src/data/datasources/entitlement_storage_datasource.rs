use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{domain::repositories::entitlement_storage::EntitlementStorage, errors::StorageError};

/// Keeps the product list in memory only.
#[derive(Default)]
pub struct InMemoryEntitlementStorage {
    product_ids: Mutex<Vec<String>>,
}

impl InMemoryEntitlementStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(product_ids: Vec<String>) -> Self {
        Self {
            product_ids: Mutex::new(product_ids),
        }
    }
}

#[async_trait]
impl EntitlementStorage for InMemoryEntitlementStorage {
    async fn load(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.product_ids.lock().await.clone())
    }

    async fn store(&self, product_ids: &[String]) -> Result<(), StorageError> {
        *self.product_ids.lock().await = product_ids.to_vec();
        Ok(())
    }
}

/// Persists the product list as a JSON array of strings. A missing file reads
/// as an empty list.
pub struct JsonFileEntitlementStorage {
    path: PathBuf,
}

impl JsonFileEntitlementStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl EntitlementStorage for JsonFileEntitlementStorage {
    async fn load(&self) -> Result<Vec<String>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn store(&self, product_ids: &[String]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(product_ids).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        // Write-then-rename so a crash never leaves a truncated list behind.
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}
