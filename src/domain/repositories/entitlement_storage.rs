use async_trait::async_trait;

use crate::errors::StorageError;

/// Persistent key-value slot holding the ordered list of purchased product
/// identifiers. Read and written as a whole.
#[async_trait]
pub trait EntitlementStorage: Send + Sync + 'static {
    async fn load(&self) -> Result<Vec<String>, StorageError>;
    async fn store(&self, product_ids: &[String]) -> Result<(), StorageError>;
}
