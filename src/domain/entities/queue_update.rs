use super::transaction::{Transaction, TransactionError};

/// Something the payment queue reports to its observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueUpdate {
    /// A batch of transactions whose state changed, in arrival order.
    Transactions(Vec<Transaction>),
    /// Every restorable transaction has been delivered.
    RestoreFinished,
    RestoreFailed(TransactionError),
}
