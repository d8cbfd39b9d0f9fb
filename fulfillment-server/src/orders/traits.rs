//! Core traits and context for order command processing
//!
//! Commands are validated by [`CommandHandler`] implementations into
//! events; [`EventApplier`] implementations fold events into snapshots and
//! must stay pure. Handlers run inside the manager's write transaction and
//! may stage cross-aggregate effects (ledger commits, cart conversion,
//! coupon usage) on the same transaction through [`CommandContext`], so a
//! failed command leaves no partial state behind.

use crate::inventory::LedgerError;
use crate::storage::{self, EngineStorage, StorageError};
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::AppError;
use shared::actor::ActorContext;
use shared::cart::{CartOwner, CartSnapshot};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderSnapshot};
use thiserror::Error;

/// Order command processing errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Cart not found: {0}")]
    CartNotFound(String),

    #[error("Cart is not active: {0}")]
    CartNotActive(String),

    #[error("Cart is empty: {0}")]
    CartEmpty(String),

    #[error("No shipping option selected")]
    ShippingNotSelected,

    #[error("Coupon {code} no longer applicable: {reason}")]
    CouponNoLongerApplicable { code: String, reason: String },

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Order is not paid: {0}")]
    NotPaid(String),

    #[error("Order is already paid: {0}")]
    AlreadyPaid(String),

    #[error("Payment intent does not match order")]
    PaymentIntentMismatch,

    #[error("Shipment not found: {0}")]
    ShipmentNotFound(String),

    #[error("Nothing to ship: {0}")]
    NothingToShip(String),

    #[error("Refund not found: {0}")]
    RefundNotFound(String),

    #[error("Refund already decided: {0}")]
    RefundAlreadyDecided(String),

    #[error("Refund of {requested} exceeds refundable balance {balance}")]
    RefundExceedsBalance { requested: f64, balance: f64 },

    #[error("Invalid operation: {0}")]
    Validation(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        use shared::ErrorCode;
        match err {
            OrderError::Storage(e) => e.into(),
            OrderError::Ledger(e) => e.into(),
            OrderError::OrderNotFound(id) => AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", id),
            ),
            OrderError::CartNotFound(id) => AppError::not_found(format!("Cart {}", id)),
            OrderError::CartNotActive(id) => AppError::with_message(
                ErrorCode::CartNotActive,
                format!("Cart {} is not active", id),
            ),
            OrderError::CartEmpty(id) => {
                AppError::with_message(ErrorCode::CartEmpty, format!("Cart {} is empty", id))
            }
            OrderError::ShippingNotSelected => AppError::new(ErrorCode::ShippingNotSelected),
            OrderError::CouponNoLongerApplicable { code, reason } => AppError::with_message(
                ErrorCode::CouponNotActive,
                format!("Coupon {}: {}", code, reason),
            ),
            OrderError::InvalidTransition(msg) => AppError::invalid_transition(msg),
            OrderError::NotPaid(id) => AppError::with_message(
                ErrorCode::OrderNotPaid,
                format!("Order {} is not paid", id),
            ),
            OrderError::AlreadyPaid(id) => AppError::with_message(
                ErrorCode::OrderAlreadyPaid,
                format!("Order {} is already paid", id),
            ),
            OrderError::PaymentIntentMismatch => AppError::new(ErrorCode::PaymentIntentMismatch),
            OrderError::ShipmentNotFound(id) => AppError::with_message(
                ErrorCode::ShipmentNotFound,
                format!("Shipment {} not found", id),
            ),
            OrderError::NothingToShip(msg) => {
                AppError::with_message(ErrorCode::NothingToShip, msg)
            }
            OrderError::RefundNotFound(id) => AppError::with_message(
                ErrorCode::RefundNotFound,
                format!("Refund {} not found", id),
            ),
            OrderError::RefundAlreadyDecided(id) => AppError::with_message(
                ErrorCode::RefundAlreadyDecided,
                format!("Refund {} already decided", id),
            ),
            OrderError::RefundExceedsBalance { requested, balance } => AppError::with_message(
                ErrorCode::RefundExceedsBalance,
                format!("refund of {requested} exceeds refundable balance {balance}"),
            ),
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::InvariantViolation(msg) => AppError::invariant_violation(msg),
        }
    }
}

/// Command metadata extracted once per command
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor: ActorContext,
    /// Client timestamp (audit only)
    pub timestamp: i64,
}

impl CommandMetadata {
    pub fn from_command(cmd: &shared::order::OrderCommand) -> Self {
        Self {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor.clone(),
            timestamp: cmd.timestamp,
        }
    }

    /// Build an event stamped with this command's actor and id
    pub fn event(
        &self,
        sequence: u64,
        order_id: String,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> OrderEvent {
        OrderEvent::new(
            sequence,
            order_id,
            self.actor.audit_id(),
            self.actor.actor_name.clone(),
            self.command_id.clone(),
            Some(self.timestamp),
            event_type,
            payload,
        )
    }
}

/// Ownership check for orders
///
/// Store owner and system pass; customers must own the order. A foreign
/// order answers exactly like a missing one, never confirming it exists.
pub fn authorize_order(snapshot: &OrderSnapshot, actor: &ActorContext) -> Result<(), OrderError> {
    if actor.is_store_owner() || actor.is_system() {
        return Ok(());
    }
    let authorized = match &snapshot.owner {
        CartOwner::Account { account_id } => actor.account_id.as_deref() == Some(account_id),
        CartOwner::Device { device_id } => actor.device_id.as_deref() == Some(device_id),
    };
    if authorized {
        Ok(())
    } else {
        Err(OrderError::OrderNotFound(snapshot.order_id.clone()))
    }
}

/// Store-owner/system gate for fulfillment operations
///
/// Fails as not-found so role probing cannot confirm an order exists.
pub fn require_fulfillment_role(
    order_id: &str,
    actor: &ActorContext,
) -> Result<(), OrderError> {
    if actor.is_store_owner() || actor.is_system() {
        Ok(())
    } else {
        Err(OrderError::OrderNotFound(order_id.to_string()))
    }
}

/// Execution context handed to command handlers
///
/// Wraps the manager's write transaction: snapshot/cart loads see writes
/// staged earlier in the same command, and sequence allocation is
/// transactional with the event append.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a EngineStorage,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a EngineStorage) -> Self {
        Self { txn, storage }
    }

    /// The underlying transaction, for cross-aggregate effects
    pub fn txn(&self) -> &'a WriteTransaction {
        self.txn
    }

    /// Load an order snapshot
    pub fn load_snapshot(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        storage::load_order_snapshot(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Load a cart
    pub fn load_cart(&self, cart_id: &str) -> Result<CartSnapshot, OrderError> {
        storage::load_cart(self.txn, cart_id)?
            .ok_or_else(|| OrderError::CartNotFound(cart_id.to_string()))
    }

    /// Allocate the next global event sequence number
    pub fn next_sequence(&mut self) -> Result<u64, OrderError> {
        Ok(self.storage.increment_sequence(self.txn)?)
    }
}

/// Command handler - validates a command and emits events
///
/// Handlers are synchronous: all state lives in the embedded storage, and
/// external collaborators (gateway, rate provider) are called before or
/// after the command, never inside its transaction.
pub trait CommandHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

/// Event applier - folds one event into a snapshot. PURE: appliers see only
/// the snapshot and the event, never storage.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}
