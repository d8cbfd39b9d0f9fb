//! OrdersManager - command processing and event generation
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to the snapshot via EventAppliers
//!     ├─ 6. Persist events and snapshot
//!     ├─ 7. Mark command processed
//!     ├─ 8. Commit transaction
//!     ├─ 9. Broadcast event(s)
//!     └─ 10. Return response
//! ```
//!
//! Steps 2-8 are one transaction: a command that fails anywhere - including
//! a ledger consumption inside RecordPayment - leaves no partial state.

use super::actions::{CheckoutAction, CommandAction};
use super::appliers::EventAction;
use super::traits::{
    CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError, authorize_order,
};
use crate::storage::{
    EngineStorage, StorageError, load_order_snapshot, mark_command_processed, store_order_event,
    store_order_snapshot,
};
use chrono::Utc;
use chrono_tz::Tz;
use shared::actor::ActorContext;
use shared::order::{
    CommandResponse, OrderCommand, OrderCommandPayload, OrderEvent, OrderSnapshot,
};
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// OrdersManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup;
/// clients use it to detect server restarts and trigger a full resync.
pub struct OrdersManager {
    storage: EngineStorage,
    event_tx: broadcast::Sender<OrderEvent>,
    epoch: String,
    /// Business timezone for order numbering
    tz: Tz,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("epoch", &self.epoch)
            .field("tz", &self.tz)
            .finish_non_exhaustive()
    }
}

impl OrdersManager {
    pub fn new(storage: EngineStorage, tz: Tz) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "OrdersManager started with new epoch");
        Self {
            storage,
            event_tx,
            epoch,
            tz,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &EngineStorage {
        &self.storage
    }

    /// Read an order snapshot (ownership-checked)
    pub fn get_order(
        &self,
        order_id: &str,
        actor: &ActorContext,
    ) -> Result<OrderSnapshot, OrderError> {
        let snapshot = self
            .storage
            .get_order_snapshot(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        authorize_order(&snapshot, actor)?;
        Ok(snapshot)
    }

    /// Read an order's event stream (ownership-checked)
    pub fn get_order_events(
        &self,
        order_id: &str,
        actor: &ActorContext,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.get_order(order_id, actor)?;
        Ok(self.storage.get_order_events(order_id)?)
    }

    /// Generate the next order number (crash-safe via the storage counter)
    fn next_order_number(&self) -> Result<String, OrderError> {
        let count = self.storage.next_order_count()?;
        let date_str = Utc::now().with_timezone(&self.tz).format("%Y%m%d").to_string();
        Ok(format!("ORD{}{}", date_str, 10000 + count))
    }

    /// Execute a command and return the response
    ///
    /// Command processing itself is synchronous (embedded storage, no
    /// external calls inside the transaction); the async signature keeps
    /// call sites uniform with the rest of the service layer.
    pub async fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                // Broadcast only after a successful commit
                for event in events {
                    if self.event_tx.send(event).is_err() {
                        tracing::debug!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                response
            }
            Err(err) => {
                tracing::warn!(command_id = %command_id, error = %err, "Command failed");
                CommandResponse::error(command_id, shared::AppError::from(err).into())
            }
        }
    }

    /// Process a command and return the response with its events
    fn process_command(
        &self,
        cmd: OrderCommand,
    ) -> Result<(CommandResponse, Vec<OrderEvent>), OrderError> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before the transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        let metadata = CommandMetadata::from_command(&cmd);

        // 2. Checkout pre-check: don't spend an order number on a cart that
        // cannot convert
        let action = match &cmd.payload {
            OrderCommandPayload::Checkout { cart_id } => {
                match self.storage.get_cart(cart_id)? {
                    Some(cart) if cart.is_active() => {}
                    Some(_) => return Err(OrderError::CartNotActive(cart_id.clone())),
                    None => return Err(OrderError::CartNotFound(cart_id.clone())),
                }
                CommandAction::Checkout(CheckoutAction {
                    cart_id: cart_id.clone(),
                    order_id: uuid::Uuid::new_v4().to_string(),
                    order_number: self.next_order_number()?,
                })
            }
            _ => CommandAction::from(&cmd),
        };

        // 3-4. Execute the action inside one transaction
        let txn = self.storage.begin_write()?;
        let events = {
            let mut ctx = CommandContext::new(&txn, &self.storage);
            action.execute(&mut ctx, &metadata)?
        };
        let Some(first) = events.first() else {
            return Err(OrderError::InvariantViolation(
                "action produced no events".into(),
            ));
        };
        let order_id = first.order_id.clone();

        // 5. Fold events into the snapshot
        let mut snapshot = match &first.payload {
            shared::order::EventPayload::OrderCreated { .. } => {
                OrderSnapshot::new(order_id.clone())
            }
            _ => load_order_snapshot(&txn, &order_id)?
                .ok_or_else(|| OrderError::OrderNotFound(order_id.clone()))?,
        };
        for event in &events {
            EventAction::from(event).apply(&mut snapshot, event);
        }

        // 6-7. Persist events, snapshot, idempotency marker
        for event in &events {
            store_order_event(&txn, event)?;
        }
        store_order_snapshot(&txn, &snapshot)?;
        mark_command_processed(&txn, &cmd.command_id)?;

        // 8. Commit
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            command_id = %cmd.command_id,
            order_id = %order_id,
            events = events.len(),
            status = ?snapshot.status,
            "Command processed"
        );
        Ok((CommandResponse::ok(cmd.command_id, snapshot), events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryLedger;
    use crate::storage::{set_owner_index, store_cart};
    use shared::cart::{CartItem, CartOwner, CartSnapshot, CartStatus};
    use shared::order::{OrderCommandPayload, OrderStatus, PaymentOutcome, PaymentStatus};

    fn storage_with_cart(quantity: i32) -> (EngineStorage, InventoryLedger, CartSnapshot) {
        let storage = EngineStorage::open_in_memory().unwrap();
        let ledger = InventoryLedger::new(storage.clone());
        let actor = ActorContext::system();
        ledger.adjust_quantity("listing-1", 10, &actor).unwrap();

        let mut cart = CartSnapshot::new(
            "cart-1".into(),
            CartOwner::Account {
                account_id: "acc-1".into(),
            },
            "USD".into(),
        );
        cart.items = vec![CartItem {
            listing_id: "listing-1".into(),
            name: "Mug".into(),
            quantity,
            price_snapshot: 45.0,
            selected_options: None,
            is_gift: false,
            is_digital: true,
            weight: None,
        }];
        crate::carts::money::recalculate_totals(&mut cart, 0.0);
        ledger
            .reserve("listing-1", quantity as i64, "cart-1", &actor)
            .unwrap();

        let txn = storage.begin_write().unwrap();
        store_cart(&txn, &cart).unwrap();
        set_owner_index(&txn, &cart.owner.key(), &cart.cart_id).unwrap();
        txn.commit().unwrap();
        (storage, ledger, cart)
    }

    fn manager(storage: &EngineStorage) -> OrdersManager {
        OrdersManager::new(storage.clone(), chrono_tz::UTC)
    }

    async fn checkout(manager: &OrdersManager, cart_id: &str) -> CommandResponse {
        manager
            .execute_command(OrderCommand::new(
                ActorContext::customer("acc-1"),
                OrderCommandPayload::Checkout {
                    cart_id: cart_id.into(),
                },
            ))
            .await
    }

    #[tokio::test]
    async fn checkout_converts_cart_and_creates_pending_order() {
        let (storage, _ledger, cart) = storage_with_cart(2);
        let manager = manager(&storage);

        let response = checkout(&manager, &cart.cart_id).await;
        assert!(response.success, "error: {:?}", response.error);
        let snapshot = response.snapshot.unwrap();
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.payment_status, PaymentStatus::Unpaid);
        assert_eq!(snapshot.total_price, 90.0);
        assert!(snapshot.order_number.starts_with("ORD"));

        let cart = storage.get_cart(&cart.cart_id).unwrap().unwrap();
        assert_eq!(cart.status, CartStatus::Converted);
        // The owner index is free for a fresh cart
        assert!(storage.get_active_cart_id(&cart.owner.key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_command_id_is_not_reapplied() {
        let (storage, _ledger, cart) = storage_with_cart(1);
        let manager = manager(&storage);

        let cmd = OrderCommand::new(
            ActorContext::customer("acc-1"),
            OrderCommandPayload::Checkout {
                cart_id: cart.cart_id.clone(),
            },
        );
        let first = manager.execute_command(cmd.clone()).await;
        assert!(first.success);
        let second = manager.execute_command(cmd).await;
        assert!(second.duplicate);
        assert!(second.snapshot.is_none());
    }

    #[tokio::test]
    async fn payment_commits_consumption_atomically() {
        let (storage, ledger, cart) = storage_with_cart(2);
        let manager = manager(&storage);
        let response = checkout(&manager, &cart.cart_id).await;
        let order_id = response.order_id.unwrap();

        // Attach the intent, then the gateway callback lands
        let intent = manager
            .execute_command(OrderCommand::new(
                ActorContext::system(),
                OrderCommandPayload::CreatePaymentIntent {
                    order_id: order_id.clone(),
                    intent_id: "pi_1".into(),
                    amount: 90.0,
                },
            ))
            .await;
        assert!(intent.success, "error: {:?}", intent.error);

        let paid = manager
            .execute_command(OrderCommand::new(
                ActorContext::system(),
                OrderCommandPayload::RecordPayment {
                    order_id: order_id.clone(),
                    intent_id: "pi_1".into(),
                    outcome: PaymentOutcome::Succeeded,
                },
            ))
            .await;
        assert!(paid.success, "error: {:?}", paid.error);
        let snapshot = paid.snapshot.unwrap();
        assert_eq!(snapshot.status, OrderStatus::Processing);
        assert_eq!(snapshot.payment_status, PaymentStatus::Paid);

        // Available dropped by 2, reservation fully consumed
        let record = ledger.get("listing-1").unwrap().unwrap();
        assert_eq!(record.quantity_available, 8);
        assert_eq!(record.quantity_reserved, 0);
        assert!(ledger.reconcile("listing-1").unwrap().consistent);
    }

    #[tokio::test]
    async fn mismatched_intent_fails_without_consuming_stock() {
        let (storage, ledger, cart) = storage_with_cart(2);
        let manager = manager(&storage);
        let response = checkout(&manager, &cart.cart_id).await;
        let order_id = response.order_id.unwrap();

        let paid = manager
            .execute_command(OrderCommand::new(
                ActorContext::system(),
                OrderCommandPayload::RecordPayment {
                    order_id: order_id.clone(),
                    intent_id: "pi_unknown".into(),
                    outcome: PaymentOutcome::Succeeded,
                },
            ))
            .await;
        assert!(!paid.success);

        // Nothing consumed, order untouched
        let record = ledger.get("listing-1").unwrap().unwrap();
        assert_eq!(record.quantity_available, 10);
        assert_eq!(record.quantity_reserved, 2);
        let snapshot = storage.get_order_snapshot(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn cancel_before_payment_releases_reservations() {
        let (storage, ledger, cart) = storage_with_cart(2);
        let manager = manager(&storage);
        let response = checkout(&manager, &cart.cart_id).await;
        let order_id = response.order_id.unwrap();

        let cancelled = manager
            .execute_command(OrderCommand::new(
                ActorContext::customer("acc-1"),
                OrderCommandPayload::CancelOrder {
                    order_id: order_id.clone(),
                    reason: Some("changed my mind".into()),
                },
            ))
            .await;
        assert!(cancelled.success, "error: {:?}", cancelled.error);
        assert_eq!(cancelled.snapshot.unwrap().status, OrderStatus::Cancelled);

        let record = ledger.get("listing-1").unwrap().unwrap();
        assert_eq!(record.quantity_available, 10);
        assert_eq!(record.quantity_reserved, 0);
    }

    #[tokio::test]
    async fn replay_matches_cached_snapshot() {
        let (storage, _ledger, cart) = storage_with_cart(2);
        let manager = manager(&storage);
        let response = checkout(&manager, &cart.cart_id).await;
        let order_id = response.order_id.unwrap();

        manager
            .execute_command(OrderCommand::new(
                ActorContext::system(),
                OrderCommandPayload::CreatePaymentIntent {
                    order_id: order_id.clone(),
                    intent_id: "pi_1".into(),
                    amount: 90.0,
                },
            ))
            .await;
        manager
            .execute_command(OrderCommand::new(
                ActorContext::system(),
                OrderCommandPayload::RecordPayment {
                    order_id: order_id.clone(),
                    intent_id: "pi_1".into(),
                    outcome: PaymentOutcome::Succeeded,
                },
            ))
            .await;

        let events = storage.get_order_events(&order_id).unwrap();
        let replayed = crate::orders::reducer::replay(&order_id, &events);
        let cached = storage.get_order_snapshot(&order_id).unwrap().unwrap();
        assert_eq!(replayed.state_checksum, cached.state_checksum);
        assert_eq!(replayed.status, cached.status);
    }

    #[tokio::test]
    async fn foreign_order_reads_as_missing() {
        let (storage, _ledger, cart) = storage_with_cart(1);
        let manager = manager(&storage);
        let response = checkout(&manager, &cart.cart_id).await;
        let order_id = response.order_id.unwrap();

        let err = manager
            .get_order(&order_id, &ActorContext::customer("acc-other"))
            .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }
}
