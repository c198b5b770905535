use chrono::{DateTime, Utc};

/// Decoded app receipt, as returned by the verifyReceipt endpoint.
///
/// String fields are empty rather than absent when the response omits them
/// or carries an unexpected type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub bundle_id: String,
    pub app_version: String,
    pub original_app_version: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub in_app: Vec<InAppPurchaseRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InAppPurchaseRecord {
    pub quantity: i64,
    pub product_id: String,
    pub transaction_id: String,
    pub original_transaction_id: String,
    pub purchase_date: Option<DateTime<Utc>>,
    pub original_purchase_date: Option<DateTime<Utc>>,
}

impl Receipt {
    /// Records with no product id never match.
    pub fn contains_purchase(&self, product_id: &str) -> bool {
        !product_id.is_empty() && self.in_app.iter().any(|p| p.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(product_id: &str) -> InAppPurchaseRecord {
        InAppPurchaseRecord {
            quantity: 1,
            product_id: product_id.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn contains_purchase_matches_on_product_id() {
        let receipt = Receipt {
            in_app: vec![record("com.app.pro"), record("com.app.coins")],
            ..Default::default()
        };
        assert!(receipt.contains_purchase("com.app.pro"));
        assert!(receipt.contains_purchase("com.app.coins"));
        assert!(!receipt.contains_purchase("com.app.other"));
    }

    #[test]
    fn empty_receipt_contains_nothing() {
        assert!(!Receipt::default().contains_purchase("com.app.pro"));
        assert!(!Receipt::default().contains_purchase(""));
    }

    #[test]
    fn record_without_product_id_matches_nothing() {
        let receipt = Receipt {
            in_app: vec![InAppPurchaseRecord::default(), record("com.app.pro")],
            ..Default::default()
        };
        assert!(!receipt.contains_purchase(""));
        assert!(receipt.contains_purchase("com.app.pro"));
    }
}
