use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// The payment is being processed by the store.
    Purchasing,
    /// Awaiting an external decision, such as Ask to Buy approval.
    Deferred,
    Failed,
    Purchased,
    /// Delivered as part of a restore-all operation.
    Restored,
}

/// Error codes the payment queue attaches to failed transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorCode {
    Unknown,
    ClientInvalid,
    PaymentCancelled,
    PaymentInvalid,
    PaymentNotAllowed,
    StoreProductNotAvailable,
    CloudServicePermissionDenied,
    CloudServiceNetworkConnectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code:?})")]
pub struct TransactionError {
    pub code: TransactionErrorCode,
    pub message: String,
}

impl TransactionError {
    pub fn new(code: TransactionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.code == TransactionErrorCode::PaymentCancelled
    }
}

/// A transaction as handed over by the payment queue. The queue owns it; it
/// is redelivered until finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Assigned by the store once the payment has been processed, so absent
    /// while `Purchasing`.
    pub transaction_id: Option<String>,
    pub product_id: String,
    pub state: TransactionState,
    pub error: Option<TransactionError>,
}

impl Transaction {
    pub fn new(product_id: impl Into<String>, state: TransactionState) -> Self {
        Self {
            transaction_id: None,
            product_id: product_id.into(),
            state,
            error: None,
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_error(mut self, error: TransactionError) -> Self {
        self.error = Some(error);
        self
    }

    /// Identity used to recognize a redelivery of the same transaction.
    pub(crate) fn key(&self) -> &str {
        self.transaction_id.as_deref().unwrap_or(&self.product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefers_transaction_id() {
        let pending = Transaction::new("com.app.pro", TransactionState::Purchasing);
        assert_eq!(pending.key(), "com.app.pro");
        let purchased = pending.with_transaction_id("1000000001");
        assert_eq!(purchased.key(), "1000000001");
    }

    #[test]
    fn only_payment_cancelled_is_a_cancellation() {
        assert!(
            TransactionError::new(TransactionErrorCode::PaymentCancelled, "").is_cancellation()
        );
        assert!(
            !TransactionError::new(TransactionErrorCode::PaymentInvalid, "").is_cancellation()
        );
    }
}
