/// verifyReceipt endpoint for receipts issued by the production App Store.
pub(crate) const PRODUCTION_VERIFY_RECEIPT_URL: &str = "https://buy.itunes.apple.com/verifyReceipt";
/// verifyReceipt endpoint for receipts issued in the sandbox.
pub(crate) const SANDBOX_VERIFY_RECEIPT_URL: &str =
    "https://sandbox.itunes.apple.com/verifyReceipt";

pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;
pub(crate) const DEFAULT_RECEIPT_PATH: &str = "StoreKit/receipt";
pub(crate) const DEFAULT_ENTITLEMENTS_PATH: &str = "purchased_products.json";

// Environment keys read by `StoreKitConfig::from_env`.
pub(crate) const ENV_ENVIRONMENT: &str = "STOREKIT_ENVIRONMENT";
pub(crate) const ENV_TIMEOUT_SECS: &str = "STOREKIT_TIMEOUT_SECS";
pub(crate) const ENV_VALIDATE_RESTORES: &str = "STOREKIT_VALIDATE_RESTORES";
pub(crate) const ENV_RECEIPT_PATH: &str = "STOREKIT_RECEIPT_PATH";
pub(crate) const ENV_ENTITLEMENTS_PATH: &str = "STOREKIT_ENTITLEMENTS_PATH";
pub(crate) const ENV_PRODUCT_IDS: &str = "STOREKIT_PRODUCT_IDS";
