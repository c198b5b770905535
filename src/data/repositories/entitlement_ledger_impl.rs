use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    domain::repositories::{
        entitlement_ledger::EntitlementLedger, entitlement_storage::EntitlementStorage,
    },
    errors::StorageError,
};

/// Entitlement ledger over a whole-list key-value store.
///
/// Writes hold `write_lock` across the load-check-store sequence so two
/// completions recording products concurrently cannot lose each other's
/// update.
pub struct EntitlementLedgerImpl<S: EntitlementStorage> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: EntitlementStorage> EntitlementLedgerImpl<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<S: EntitlementStorage> EntitlementLedger for EntitlementLedgerImpl<S> {
    async fn is_purchased(&self, product_id: &str) -> Result<bool, StorageError> {
        Ok(self
            .storage
            .load()
            .await?
            .iter()
            .any(|p| p == product_id))
    }

    async fn record_purchase(&self, product_id: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let stored = self.storage.load().await?;
        if stored.iter().any(|p| p == product_id) {
            debug!(product_id, "entitlement already recorded");
            return Ok(());
        }
        // Collapse any duplicates written by an earlier, less careful writer.
        let mut product_ids: Vec<String> = Vec::with_capacity(stored.len() + 1);
        for p in stored {
            if !product_ids.contains(&p) {
                product_ids.push(p);
            }
        }
        product_ids.push(product_id.to_owned());
        self.storage.store(&product_ids).await?;
        info!(product_id, "entitlement recorded");
        Ok(())
    }

    async fn purchased_products(&self) -> Result<Vec<String>, StorageError> {
        self.storage.load().await
    }
}
