use base64::{prelude::BASE64_STANDARD, Engine as _};
use serde::Serialize;

/// Request body for the verifyReceipt endpoint.
///
/// https://developer.apple.com/documentation/appstorereceipts/requestbody
#[derive(Debug, Serialize)]
pub(crate) struct VerifyReceiptRequestModel {
    /// The Base64-encoded receipt data.
    #[serde(rename = "receipt-data")]
    pub(crate) receipt_data: String,
}

impl VerifyReceiptRequestModel {
    pub(crate) fn from_receipt(receipt: &[u8]) -> Self {
        Self {
            receipt_data: BASE64_STANDARD.encode(receipt),
        }
    }
}
