use async_trait::async_trait;

use crate::{domain::entities::validation_result::ValidationResult, errors::ValidationError};

#[async_trait]
pub trait ReceiptValidator: Send + Sync + 'static {
    /// Verifies the raw app receipt with the receipt service and decodes it.
    ///
    /// Completes exactly once; every failure is returned as a
    /// `ValidationError`.
    async fn validate(&self, receipt: &[u8]) -> ValidationResult;

    /// Like `validate`, but additionally requires that the receipt contains a
    /// purchase of `product_id`. A receipt that is valid but does not list
    /// the product yields `PurchaseNotFoundInReceipt`.
    async fn validate_purchase(&self, receipt: &[u8], product_id: &str) -> ValidationResult {
        let receipt = self.validate(receipt).await?;
        if receipt.contains_purchase(product_id) {
            Ok(receipt)
        } else {
            Err(ValidationError::PurchaseNotFoundInReceipt {
                product_id: product_id.to_owned(),
            })
        }
    }
}
