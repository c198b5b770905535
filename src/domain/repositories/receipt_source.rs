use async_trait::async_trait;

use crate::errors::StorageError;

/// Provides the raw app receipt stored on the device.
#[async_trait]
pub trait ReceiptSource: Send + Sync + 'static {
    async fn load_receipt(&self) -> Result<Vec<u8>, StorageError>;
}
