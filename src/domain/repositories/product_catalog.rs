use async_trait::async_trait;

use crate::domain::entities::product::Product;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up metadata for `product_ids`. Unknown identifiers are left out
    /// of the result.
    async fn request_products(&self, product_ids: &[String]) -> Vec<Product>;
}
