use crate::errors::{PurchaseError, RestoreError};

use super::product::Product;

/// Outcome notifications fanned out to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NoProductsFound,
    ProductsRetrieved(Vec<Product>),
    PurchaseProcessing {
        product_id: String,
    },
    PurchaseDeferred {
        product_id: String,
    },
    PurchaseCancelled {
        product_id: String,
    },
    PurchaseFailed {
        product_id: String,
        error: PurchaseError,
    },
    PurchaseCompleted {
        product_id: String,
    },
    /// `product_id` is set when a single restored transaction failed, and
    /// absent when the restore operation as a whole failed.
    RestoreFailed {
        product_id: Option<String>,
        error: RestoreError,
    },
    RestoreCompleted {
        product_id: String,
    },
}

impl StoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::NoProductsFound => "no-products-found",
            StoreEvent::ProductsRetrieved(_) => "products-retrieved",
            StoreEvent::PurchaseProcessing { .. } => "purchase-processing",
            StoreEvent::PurchaseDeferred { .. } => "purchase-deferred",
            StoreEvent::PurchaseCancelled { .. } => "purchase-cancelled",
            StoreEvent::PurchaseFailed { .. } => "purchase-failed",
            StoreEvent::PurchaseCompleted { .. } => "purchase-completed",
            StoreEvent::RestoreFailed { .. } => "restore-failed",
            StoreEvent::RestoreCompleted { .. } => "restore-completed",
        }
    }

    pub fn product_id(&self) -> Option<&str> {
        match self {
            StoreEvent::PurchaseProcessing { product_id }
            | StoreEvent::PurchaseDeferred { product_id }
            | StoreEvent::PurchaseCancelled { product_id }
            | StoreEvent::PurchaseFailed { product_id, .. }
            | StoreEvent::PurchaseCompleted { product_id }
            | StoreEvent::RestoreCompleted { product_id } => Some(product_id.as_str()),
            StoreEvent::RestoreFailed { product_id, .. } => product_id.as_deref(),
            StoreEvent::NoProductsFound | StoreEvent::ProductsRetrieved(_) => None,
        }
    }
}
