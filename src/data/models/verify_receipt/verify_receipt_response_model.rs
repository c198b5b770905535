use serde::Deserialize;
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst, VecSkipError};

/// The `receipt` object of a verifyReceipt response body.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody/receipt
///
/// Every field falls back to its default when missing or of an unexpected
/// type, so one bad field never fails the whole receipt. Numeric fields are
/// sent as numeric strings by the service; plain numbers are accepted too.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReceiptModel {
    /// The bundle identifier for the app to which the receipt belongs.
    #[serde_as(as = "DefaultOnError")]
    pub(crate) bundle_id: String,
    /// The app's version number (CFBundleVersion).
    #[serde_as(as = "DefaultOnError")]
    pub(crate) application_version: String,
    /// The version of the app that the user originally purchased.
    #[serde_as(as = "DefaultOnError")]
    pub(crate) original_application_version: String,
    /// The time the receipt expires for apps purchased through the Volume
    /// Purchase Program, in UNIX epoch time milliseconds.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub(crate) expiration_date_ms: Option<i64>,
    /// The in-app purchase receipt fields for all in-app purchase
    /// transactions. Elements that are not objects are skipped.
    #[serde_as(as = "DefaultOnError<VecSkipError<_>>")]
    pub(crate) in_app: Vec<InAppModel>,
}

/// An array element of `receipt.in_app`.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody/receipt/in_app
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct InAppModel {
    /// The number of consumable products purchased.
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) quantity: i64,
    /// The unique identifier of the product purchased.
    #[serde_as(as = "DefaultOnError")]
    pub(crate) product_id: String,
    /// A unique identifier for a transaction such as a purchase, restore, or
    /// renewal.
    #[serde_as(as = "DefaultOnError")]
    pub(crate) transaction_id: String,
    /// The transaction identifier of the original purchase.
    #[serde_as(as = "DefaultOnError")]
    pub(crate) original_transaction_id: String,
    /// The time the App Store charged the user's account for a purchased or
    /// restored product, in UNIX epoch time milliseconds.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub(crate) purchase_date_ms: Option<i64>,
    /// The time of the original in-app purchase, in UNIX epoch time
    /// milliseconds.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub(crate) original_purchase_date_ms: Option<i64>,
}
