//! Transaction coordinator.
//!
//! A single task owns every piece of mutable coordination state. Payment
//! queue updates, purchase and restore requests, and finished receipt
//! validations all arrive as messages and are handled one at a time, so
//! ledger writes and finalization never interleave.
//!
//! ```text
//! Purchasing ──▶ Deferred
//!     │
//!     ├────────▶ Failed ──────────────────────────▶ finished
//!     │
//!     └────────▶ Purchased ──(validate)──┬─ ok ────▶ recorded, finished
//!                                        └─ error ─▶ left open for redelivery
//!
//! restore ──▶ Restored* ──(validate)──▶ recorded, finished
//!        └──▶ RestoreFinished | RestoreFailed
//! ```

use std::{
    collections::{HashMap, HashSet, VecDeque},
    future::Future,
    sync::Arc,
};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::{
    domain::{
        entities::{
            queue_update::QueueUpdate,
            store_event::StoreEvent,
            transaction::{Transaction, TransactionError, TransactionErrorCode, TransactionState},
            validation_result::ValidationResult,
        },
        repositories::{
            entitlement_ledger::EntitlementLedger, event_sink::EventSink,
            payment_queue::PaymentQueue, receipt_source::ReceiptSource,
            receipt_validator::ReceiptValidator,
        },
    },
    errors::{PurchaseError, RestoreError, ValidationError},
};

type PurchaseReply = oneshot::Sender<Result<(), PurchaseError>>;
type RestoreReply = oneshot::Sender<Result<(), RestoreError>>;

enum Command {
    Queue(QueueUpdate),
    Purchase {
        product_id: String,
        reply: PurchaseReply,
    },
    Restore {
        reply: RestoreReply,
    },
}

struct Validated {
    transaction: Transaction,
    result: ValidationResult,
}

/// Cloneable handle used to talk to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    /// Hands a payment queue update to the coordinator. Never blocks; returns
    /// `false` if the coordinator has stopped.
    pub fn deliver(&self, update: QueueUpdate) -> bool {
        self.commands.send(Command::Queue(update)).is_ok()
    }

    /// Submits a payment for `product_id`.
    ///
    /// The request is registered before this returns, so queue updates
    /// delivered afterwards are matched against it. The returned future
    /// resolves once the purchase is confirmed, fails, or is cancelled.
    pub fn purchase(
        &self,
        product_id: &str,
    ) -> impl Future<Output = Result<(), PurchaseError>> + Send + 'static {
        let (reply, outcome) = oneshot::channel();
        let _ = self.commands.send(Command::Purchase {
            product_id: product_id.to_owned(),
            reply,
        });
        async move {
            outcome
                .await
                .unwrap_or(Err(PurchaseError::CoordinatorStopped))
        }
    }

    /// Asks the payment queue to redeliver every restorable transaction. The
    /// returned future resolves when the queue reports the restore finished
    /// and every restored transaction has been handled.
    pub fn restore(&self) -> impl Future<Output = Result<(), RestoreError>> + Send + 'static {
        let (reply, outcome) = oneshot::channel();
        let _ = self.commands.send(Command::Restore { reply });
        async move {
            outcome
                .await
                .unwrap_or(Err(RestoreError::CoordinatorStopped))
        }
    }
}

pub struct TransactionCoordinator<V, L, Q, R, E>
where
    V: ReceiptValidator,
    L: EntitlementLedger,
    Q: PaymentQueue,
    R: ReceiptSource,
    E: EventSink,
{
    validator: Arc<V>,
    ledger: Arc<L>,
    payment_queue: Q,
    receipt_source: Arc<R>,
    events: E,
    validate_restored_transactions: bool,

    commands: mpsc::UnboundedReceiver<Command>,
    validated_tx: mpsc::UnboundedSender<Validated>,
    validated_rx: mpsc::UnboundedReceiver<Validated>,

    /// Waiting purchase callers, oldest first, per product.
    pending_purchases: HashMap<String, VecDeque<PurchaseReply>>,
    /// One waiter per requested restore, oldest first. Each restore-finished
    /// or restore-failed update from the queue settles the oldest.
    pending_restores: VecDeque<RestoreReply>,
    /// Restores the queue has finished whose restored transactions are
    /// still being validated.
    draining_restores: Vec<RestoreReply>,
    /// Keys of transactions currently being validated. Redeliveries of these
    /// are ignored until the validation completes.
    validating: HashSet<String>,
    restores_validating: usize,
}

impl<V, L, Q, R, E> TransactionCoordinator<V, L, Q, R, E>
where
    V: ReceiptValidator,
    L: EntitlementLedger,
    Q: PaymentQueue,
    R: ReceiptSource,
    E: EventSink,
{
    pub fn new(
        validator: Arc<V>,
        ledger: Arc<L>,
        payment_queue: Q,
        receipt_source: Arc<R>,
        events: E,
        validate_restored_transactions: bool,
    ) -> (Self, CoordinatorHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (validated_tx, validated_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            validator,
            ledger,
            payment_queue,
            receipt_source,
            events,
            validate_restored_transactions,
            commands,
            validated_tx,
            validated_rx,
            pending_purchases: HashMap::new(),
            pending_restores: VecDeque::new(),
            draining_restores: Vec::new(),
            validating: HashSet::new(),
            restores_validating: 0,
        };
        (
            coordinator,
            CoordinatorHandle {
                commands: commands_tx,
            },
        )
    }

    /// Builds the coordinator and runs it on the current tokio runtime.
    pub fn start(
        validator: Arc<V>,
        ledger: Arc<L>,
        payment_queue: Q,
        receipt_source: Arc<R>,
        events: E,
        validate_restored_transactions: bool,
    ) -> CoordinatorHandle {
        let (coordinator, handle) = Self::new(
            validator,
            ledger,
            payment_queue,
            receipt_source,
            events,
            validate_restored_transactions,
        );
        tokio::spawn(coordinator.run());
        handle
    }

    /// Processes messages until every `CoordinatorHandle` has been dropped.
    /// Validations still in flight at that point are abandoned; their
    /// transactions remain open and will be redelivered.
    pub async fn run(mut self) {
        debug!("transaction coordinator started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(validated) = self.validated_rx.recv() => {
                    self.handle_validated(validated).await;
                }
            }
        }
        debug!("transaction coordinator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Queue(QueueUpdate::Transactions(transactions)) => {
                for transaction in transactions {
                    self.handle_transaction(transaction).await;
                }
            }
            Command::Queue(QueueUpdate::RestoreFinished) => {
                let Some(reply) = self.pending_restores.pop_front() else {
                    debug!("restore finished with no caller waiting");
                    return;
                };
                if self.restores_validating == 0 {
                    let _ = reply.send(Ok(()));
                } else {
                    debug!(
                        in_flight = self.restores_validating,
                        "restore finished; waiting for restored transactions"
                    );
                    self.draining_restores.push(reply);
                }
            }
            Command::Queue(QueueUpdate::RestoreFailed(error)) => {
                warn!(%error, "restore failed");
                let error = RestoreError::Failed(error);
                self.events.emit(StoreEvent::RestoreFailed {
                    product_id: None,
                    error: error.clone(),
                });
                match self.pending_restores.pop_front() {
                    Some(reply) => {
                        let _ = reply.send(Err(error));
                    }
                    None => debug!("no caller waiting on restore"),
                }
            }
            Command::Purchase { product_id, reply } => {
                info!(%product_id, "purchase requested");
                self.pending_purchases
                    .entry(product_id.clone())
                    .or_default()
                    .push_back(reply);
                self.payment_queue.add_payment(&product_id).await;
            }
            Command::Restore { reply } => {
                info!("restore requested");
                self.pending_restores.push_back(reply);
                self.payment_queue.restore_completed_transactions().await;
            }
        }
    }

    async fn handle_transaction(&mut self, transaction: Transaction) {
        debug!(
            product_id = %transaction.product_id,
            transaction_id = ?transaction.transaction_id,
            state = ?transaction.state,
            "transaction updated"
        );
        match transaction.state {
            TransactionState::Purchasing => {
                self.events.emit(StoreEvent::PurchaseProcessing {
                    product_id: transaction.product_id,
                });
            }
            TransactionState::Deferred => {
                self.events.emit(StoreEvent::PurchaseDeferred {
                    product_id: transaction.product_id,
                });
            }
            TransactionState::Failed => self.handle_failed(transaction).await,
            TransactionState::Purchased => self.begin_validation(transaction),
            TransactionState::Restored => {
                if self.validate_restored_transactions {
                    self.begin_validation(transaction);
                } else {
                    self.complete_restored(transaction).await;
                }
            }
        }
    }

    async fn handle_failed(&mut self, transaction: Transaction) {
        let error = transaction.error.clone().unwrap_or_else(|| {
            TransactionError::new(
                TransactionErrorCode::Unknown,
                "transaction failed without an error",
            )
        });
        let product_id = transaction.product_id.clone();
        if error.is_cancellation() {
            info!(%product_id, "purchase cancelled");
            self.events.emit(StoreEvent::PurchaseCancelled {
                product_id: product_id.clone(),
            });
            self.resolve_purchase(&product_id, Err(PurchaseError::Cancelled));
        } else {
            warn!(%product_id, %error, "purchase failed");
            let error = PurchaseError::Failed(error);
            self.events.emit(StoreEvent::PurchaseFailed {
                product_id: product_id.clone(),
                error: error.clone(),
            });
            self.resolve_purchase(&product_id, Err(error));
        }
        self.finish(&transaction).await;
    }

    /// Starts a deep-checked receipt validation for `transaction` on a
    /// separate task. The result comes back through `validated_rx`.
    fn begin_validation(&mut self, transaction: Transaction) {
        if !self.validating.insert(transaction.key().to_owned()) {
            debug!(
                product_id = %transaction.product_id,
                "transaction redelivered while validating; ignoring"
            );
            return;
        }
        if transaction.state == TransactionState::Restored {
            self.restores_validating += 1;
        }

        let validator = self.validator.clone();
        let receipt_source = self.receipt_source.clone();
        let validated_tx = self.validated_tx.clone();
        tokio::spawn(async move {
            let result = match receipt_source.load_receipt().await {
                Ok(receipt) => {
                    validator
                        .validate_purchase(&receipt, &transaction.product_id)
                        .await
                }
                Err(e) => Err(ValidationError::StorageUnavailable {
                    message: e.to_string(),
                }),
            };
            // Only fails once the coordinator has stopped, in which case the
            // transaction stays open for redelivery.
            let _ = validated_tx.send(Validated {
                transaction,
                result,
            });
        });
    }

    async fn handle_validated(&mut self, validated: Validated) {
        let Validated {
            transaction,
            result,
        } = validated;
        self.validating.remove(transaction.key());
        match transaction.state {
            TransactionState::Restored => {
                self.restores_validating = self.restores_validating.saturating_sub(1);
                match result {
                    Ok(_) => self.complete_restored(transaction).await,
                    Err(e) => {
                        warn!(
                            product_id = %transaction.product_id,
                            error = %e,
                            "restored transaction failed validation"
                        );
                        self.events.emit(StoreEvent::RestoreFailed {
                            product_id: Some(transaction.product_id),
                            error: RestoreError::Validation(e),
                        });
                    }
                }
                if self.restores_validating == 0 {
                    for reply in self.draining_restores.drain(..) {
                        let _ = reply.send(Ok(()));
                    }
                }
            }
            _ => self.complete_purchased(transaction, result).await,
        }
    }

    async fn complete_purchased(&mut self, transaction: Transaction, result: ValidationResult) {
        let product_id = transaction.product_id.clone();
        let error = match result {
            Ok(_) => match self.ledger.record_purchase(&product_id).await {
                Ok(()) => {
                    info!(%product_id, "purchase completed");
                    self.events.emit(StoreEvent::PurchaseCompleted {
                        product_id: product_id.clone(),
                    });
                    self.resolve_purchase(&product_id, Ok(()));
                    self.finish(&transaction).await;
                    return;
                }
                Err(e) => {
                    error!(%product_id, error = %e, "validated purchase could not be recorded");
                    PurchaseError::EntitlementNotRecorded {
                        message: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(%product_id, error = %e, "purchase failed validation; leaving open");
                PurchaseError::Validation(e)
            }
        };
        // The transaction is left unfinished so the queue redelivers it.
        self.events.emit(StoreEvent::PurchaseFailed {
            product_id: product_id.clone(),
            error: error.clone(),
        });
        self.resolve_purchase(&product_id, Err(error));
    }

    async fn complete_restored(&mut self, transaction: Transaction) {
        let product_id = transaction.product_id.clone();
        match self.ledger.record_purchase(&product_id).await {
            Ok(()) => {
                info!(%product_id, "purchase restored");
                self.events.emit(StoreEvent::RestoreCompleted { product_id });
                self.finish(&transaction).await;
            }
            Err(e) => {
                error!(%product_id, error = %e, "restored purchase could not be recorded");
                self.events.emit(StoreEvent::RestoreFailed {
                    product_id: Some(product_id),
                    error: RestoreError::EntitlementNotRecorded {
                        message: e.to_string(),
                    },
                });
            }
        }
    }

    async fn finish(&self, transaction: &Transaction) {
        debug!(
            product_id = %transaction.product_id,
            transaction_id = ?transaction.transaction_id,
            "finishing transaction"
        );
        self.payment_queue.finish_transaction(transaction).await;
    }

    fn resolve_purchase(&mut self, product_id: &str, outcome: Result<(), PurchaseError>) {
        let waiter = self
            .pending_purchases
            .get_mut(product_id)
            .and_then(VecDeque::pop_front);
        if self
            .pending_purchases
            .get(product_id)
            .is_some_and(VecDeque::is_empty)
        {
            self.pending_purchases.remove(product_id);
        }
        match waiter {
            Some(reply) => {
                let _ = reply.send(outcome);
            }
            None => debug!(product_id, "no caller waiting on this purchase"),
        }
    }
}
