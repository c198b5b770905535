use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entities::transaction::TransactionError;

/// Non-zero status codes returned by the verifyReceipt endpoint.
///
/// https://developer.apple.com/documentation/appstorereceipts/status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReceiptStatusError {
    /// 21000
    #[error("the App Store could not read the JSON object provided (21000)")]
    MalformedJson,
    /// 21002
    #[error("the receipt-data property was malformed or missing (21002)")]
    MalformedReceiptData,
    /// 21003
    #[error("the receipt could not be authenticated (21003)")]
    NotAuthenticated,
    /// 21004
    #[error("the shared secret does not match the one on file for the account (21004)")]
    SharedSecretMismatch,
    /// 21005
    #[error("the receipt server is not currently available (21005)")]
    ServerUnavailable,
    /// 21006
    #[error("the receipt is valid but the subscription has expired (21006)")]
    SubscriptionExpired,
    /// 21007
    #[error("the receipt is from the sandbox but was sent to production (21007)")]
    SandboxReceiptSentToProduction,
    /// 21008
    #[error("the receipt is from production but was sent to the sandbox (21008)")]
    ProductionReceiptSentToSandbox,
    /// Any code the receipt service does not document.
    #[error("unknown receipt status code {0}")]
    Unknown(i64),
}

impl ReceiptStatusError {
    pub fn code(&self) -> i64 {
        match self {
            ReceiptStatusError::MalformedJson => 21000,
            ReceiptStatusError::MalformedReceiptData => 21002,
            ReceiptStatusError::NotAuthenticated => 21003,
            ReceiptStatusError::SharedSecretMismatch => 21004,
            ReceiptStatusError::ServerUnavailable => 21005,
            ReceiptStatusError::SubscriptionExpired => 21006,
            ReceiptStatusError::SandboxReceiptSentToProduction => 21007,
            ReceiptStatusError::ProductionReceiptSentToSandbox => 21008,
            ReceiptStatusError::Unknown(code) => *code,
        }
    }
}

/// Reasons a receipt validation call can fail. Values are cloned into both
/// the caller's completion and the emitted event, so underlying transport and
/// decoding errors are carried as their debug text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("receipt validation callout failed: {message}")]
    Network { message: String },
    #[error("receipt validation response has an unexpected format: {message}")]
    InvalidResponseFormat { message: String },
    #[error("receipt was rejected: {0}")]
    Status(#[from] ReceiptStatusError),
    #[error("validated receipt does not contain a purchase of '{product_id}'")]
    PurchaseNotFoundInReceipt { product_id: String },
    #[error("local receipt could not be read: {message}")]
    StorageUnavailable { message: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored entitlements at {path:?} could not be decoded: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome delivered to the caller of a purchase when it does not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("purchase was cancelled by the user")]
    Cancelled,
    #[error("purchase failed: {0}")]
    Failed(TransactionError),
    #[error("purchase could not be validated: {0}")]
    Validation(#[from] ValidationError),
    #[error("purchase was validated but the entitlement could not be recorded: {message}")]
    EntitlementNotRecorded { message: String },
    #[error("transaction coordinator is no longer running")]
    CoordinatorStopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("restore failed: {0}")]
    Failed(TransactionError),
    #[error("restored purchase could not be validated: {0}")]
    Validation(#[from] ValidationError),
    #[error("restored purchase could not be recorded: {message}")]
    EntitlementNotRecorded { message: String },
    #[error("transaction coordinator is no longer running")]
    CoordinatorStopped,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("HTTP client could not be built: {message}")]
    HttpClient { message: String },
}
