use async_trait::async_trait;

use crate::domain::entities::transaction::Transaction;

/// The externally owned payment queue.
///
/// Transactions it delivers stay open until `finish_transaction` is called
/// for them; unfinished transactions are redelivered.
#[async_trait]
pub trait PaymentQueue: Send + Sync + 'static {
    async fn add_payment(&self, product_id: &str);

    async fn restore_completed_transactions(&self);

    async fn finish_transaction(&self, transaction: &Transaction);
}
