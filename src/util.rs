use std::{future::Future, sync::Arc};

use tokio::sync::broadcast;
use tracing::info;

use crate::{
    config::StoreKitConfig,
    coordinator::{CoordinatorHandle, TransactionCoordinator},
    data::{
        datasources::{
            broadcast_event_sink::BroadcastEventSink,
            entitlement_storage_datasource::JsonFileEntitlementStorage,
            receipt_file_datasource::FileReceiptSource,
        },
        repositories::{
            entitlement_ledger_impl::EntitlementLedgerImpl,
            receipt_validator_impl::ReceiptValidatorImpl,
        },
    },
    domain::{
        entities::{product::Product, queue_update::QueueUpdate, store_event::StoreEvent},
        repositories::{
            entitlement_ledger::EntitlementLedger, event_sink::EventSink,
            payment_queue::PaymentQueue, product_catalog::ProductCatalog,
        },
    },
    errors::{ConfigError, PurchaseError, RestoreError, StorageError},
};

/// Entry point for the application: owns the transaction coordinator, the
/// entitlement ledger and the event fan-out for the lifetime of the process.
pub struct StoreKit<L: EntitlementLedger, C: ProductCatalog> {
    coordinator: CoordinatorHandle,
    ledger: Arc<L>,
    catalog: C,
    events: BroadcastEventSink,
    product_ids: Vec<String>,
}

impl<L: EntitlementLedger, C: ProductCatalog> StoreKit<L, C> {
    /// Assembles a `StoreKit` around an already running coordinator. `events`
    /// should be the sink the coordinator emits to, so subscribers see both
    /// catalog and transaction events.
    pub fn from_parts(
        coordinator: CoordinatorHandle,
        ledger: Arc<L>,
        catalog: C,
        events: BroadcastEventSink,
        product_ids: Vec<String>,
    ) -> Self {
        Self {
            coordinator,
            ledger,
            catalog,
            events,
            product_ids,
        }
    }

    /// Starts a purchase. The request is registered immediately; the
    /// returned future resolves with its outcome.
    pub fn purchase(
        &self,
        product_id: &str,
    ) -> impl Future<Output = Result<(), PurchaseError>> + Send + 'static {
        self.coordinator.purchase(product_id)
    }

    pub fn restore_purchases(
        &self,
    ) -> impl Future<Output = Result<(), RestoreError>> + Send + 'static {
        self.coordinator.restore()
    }

    pub async fn is_purchased(&self, product_id: &str) -> Result<bool, StorageError> {
        self.ledger.is_purchased(product_id).await
    }

    pub async fn purchased_products(&self) -> Result<Vec<String>, StorageError> {
        self.ledger.purchased_products().await
    }

    /// Looks up the configured products and reports the outcome as an event.
    pub async fn fetch_products(&self) -> Vec<Product> {
        let products = self.catalog.request_products(&self.product_ids).await;
        if products.is_empty() {
            info!(requested = self.product_ids.len(), "no products found");
            self.events.emit(StoreEvent::NoProductsFound);
        } else {
            info!(found = products.len(), "products retrieved");
            self.events.emit(StoreEvent::ProductsRetrieved(products.clone()));
        }
        products
    }

    /// Forwards an update from the payment queue. Returns `false` if the
    /// coordinator is no longer running.
    pub fn deliver(&self, update: QueueUpdate) -> bool {
        self.coordinator.deliver(update)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

impl<C: ProductCatalog> StoreKit<EntitlementLedgerImpl<JsonFileEntitlementStorage>, C> {
    /// Wires the default stack from `config`: verifyReceipt over HTTPS, the
    /// receipt file and a JSON entitlement file. Must be called from within a
    /// tokio runtime, which the coordinator is spawned onto.
    pub fn new<Q: PaymentQueue>(
        config: StoreKitConfig,
        payment_queue: Q,
        catalog: C,
    ) -> Result<Self, ConfigError> {
        let validator = Arc::new(ReceiptValidatorImpl::new(
            config.environment,
            config.request_timeout,
        )?);
        let ledger = Arc::new(EntitlementLedgerImpl::new(JsonFileEntitlementStorage::new(
            &config.entitlements_path,
        )));
        let events = BroadcastEventSink::new();
        let coordinator = TransactionCoordinator::start(
            validator,
            ledger.clone(),
            payment_queue,
            Arc::new(FileReceiptSource::new(&config.receipt_path)),
            events.clone(),
            config.validate_restored_transactions,
        );
        info!(environment = %config.environment, "store kit started");
        Ok(Self::from_parts(
            coordinator,
            ledger,
            catalog,
            events,
            config.product_ids,
        ))
    }
}
