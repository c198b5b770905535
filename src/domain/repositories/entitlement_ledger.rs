use async_trait::async_trait;

use crate::errors::StorageError;

/// Set of products this installation is entitled to.
#[async_trait]
pub trait EntitlementLedger: Send + Sync + 'static {
    async fn is_purchased(&self, product_id: &str) -> Result<bool, StorageError>;

    /// Idempotent: recording a product that is already present is a no-op.
    /// There is no way to remove an entitlement.
    async fn record_purchase(&self, product_id: &str) -> Result<(), StorageError>;

    async fn purchased_products(&self) -> Result<Vec<String>, StorageError>;
}
