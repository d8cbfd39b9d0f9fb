//! Inventory ledger operations
//!
//! # Atomicity
//!
//! Each public operation runs as one redb write transaction, so the
//! check-then-write on `available - reserved` is serialized per database:
//! two concurrent reserves can never both succeed when only one fits. The
//! `*_in_txn` functions expose the same mutations on a caller-supplied
//! transaction so checkout and payment can join ledger effects with their
//! own writes and commit or roll back as one unit.
//!
//! # Log arithmetic
//!
//! `reservation` entries carry hold deltas (reserve `-q`, release `+q`), so
//! `quantity_reserved = -Σ(reservation)`. `restock`/`adjustment`/`return`/
//! `sale` entries carry on-hand deltas, so `quantity_available = Σ` of
//! those. A `sale` entry decrements both pools at once (the hold it
//! consumes is implied), keeping one log entry per mutation.

use crate::storage::{
    self, EngineStorage, StorageError, append_inventory_transaction, load_inventory_record,
    next_inventory_sequence, set_reservation, store_inventory_record,
};
use redb::WriteTransaction;
use shared::AppError;
use shared::actor::ActorContext;
use shared::inventory::{InventoryRecord, InventoryTransaction, InventoryTransactionType};
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Inventory record not found: {0}")]
    RecordNotFound(String),

    #[error("Insufficient stock for {listing_id}: requested {requested}, available {available}")]
    InsufficientStock {
        listing_id: String,
        requested: i64,
        available: i64,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                listing_id,
                available,
                ..
            } => AppError::insufficient_stock(listing_id, available),
            LedgerError::RecordNotFound(id) => {
                AppError::not_found(format!("Inventory for {}", id))
            }
            LedgerError::InvalidQuantity(q) => {
                AppError::validation(format!("quantity must be positive, got {}", q))
            }
            LedgerError::InvariantViolation(msg) => AppError::invariant_violation(msg),
            LedgerError::Storage(e) => AppError::from(e),
        }
    }
}

/// Reconciliation report - record state vs. log replay
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReconcileReport {
    pub listing_id: String,
    pub recorded_available: i64,
    pub recorded_reserved: i64,
    pub replayed_available: i64,
    pub replayed_reserved: i64,
    pub consistent: bool,
}

// ============================================================================
// Transaction-scoped mutations
// ============================================================================

fn require_record(txn: &WriteTransaction, listing_id: &str) -> LedgerResult<InventoryRecord> {
    load_inventory_record(txn, listing_id)?
        .ok_or_else(|| LedgerError::RecordNotFound(listing_id.to_string()))
}

fn touch(record: &mut InventoryRecord) {
    record.updated_at = chrono::Utc::now().timestamp_millis();
}

/// Atomically reserve stock for a cart
///
/// The availability check and the write happen inside the same transaction;
/// callers must commit (or abort) the transaction they pass in.
pub fn reserve_in_txn(
    txn: &WriteTransaction,
    listing_id: &str,
    quantity: i64,
    cart_id: &str,
    actor: &ActorContext,
) -> LedgerResult<()> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    let mut record = require_record(txn, listing_id)?;
    let available = record.available_to_purchase();
    if available < quantity {
        return Err(LedgerError::InsufficientStock {
            listing_id: listing_id.to_string(),
            requested: quantity,
            available,
        });
    }

    record.quantity_reserved += quantity;
    touch(&mut record);
    store_inventory_record(txn, &record)?;

    let held = storage::reservation_for(txn, listing_id, cart_id)?;
    set_reservation(txn, listing_id, cart_id, held + quantity)?;

    let seq = next_inventory_sequence(txn, listing_id)?;
    let entry = InventoryTransaction::new(
        listing_id.to_string(),
        seq,
        -quantity,
        InventoryTransactionType::Reservation,
    )
    .with_cart(cart_id)
    .with_actor(actor.audit_id());
    append_inventory_transaction(txn, &entry)?;
    Ok(())
}

/// Release a cart's hold, floored at the cart's reservation and at zero
///
/// Releasing more than the cart holds is a programming error upstream; the
/// ledger clamps rather than driving reserved negative. Returns the
/// quantity actually released (0 appends no log entry - no mutation).
pub fn release_in_txn(
    txn: &WriteTransaction,
    listing_id: &str,
    quantity: i64,
    cart_id: &str,
    actor: &ActorContext,
) -> LedgerResult<i64> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    let mut record = require_record(txn, listing_id)?;
    let held = storage::reservation_for(txn, listing_id, cart_id)?;
    let released = quantity.min(held).min(record.quantity_reserved);
    if released == 0 {
        tracing::warn!(
            listing_id = %listing_id,
            cart_id = %cart_id,
            requested = quantity,
            "Release requested with no matching reservation"
        );
        return Ok(0);
    }

    record.quantity_reserved -= released;
    touch(&mut record);
    store_inventory_record(txn, &record)?;
    set_reservation(txn, listing_id, cart_id, held - released)?;

    let seq = next_inventory_sequence(txn, listing_id)?;
    let entry = InventoryTransaction::new(
        listing_id.to_string(),
        seq,
        released,
        InventoryTransactionType::Reservation,
    )
    .with_cart(cart_id)
    .with_actor(actor.audit_id());
    append_inventory_transaction(txn, &entry)?;
    Ok(released)
}

/// Convert a cart's hold into a permanent decrement at order finalization
///
/// Removes the quantity from both pools - the item is sold, not just held.
/// A missing or short reservation means the mirror invariant was broken
/// upstream, which is fatal.
pub fn commit_consumption_in_txn(
    txn: &WriteTransaction,
    listing_id: &str,
    quantity: i64,
    cart_id: &str,
    order_id: &str,
    actor: &ActorContext,
) -> LedgerResult<()> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    let mut record = require_record(txn, listing_id)?;
    let held = storage::reservation_for(txn, listing_id, cart_id)?;
    if held < quantity || record.quantity_reserved < quantity {
        return Err(LedgerError::InvariantViolation(format!(
            "commit of {} for {} exceeds reservation (held {}, reserved {})",
            quantity, listing_id, held, record.quantity_reserved
        )));
    }
    if record.quantity_available < quantity {
        return Err(LedgerError::InvariantViolation(format!(
            "commit of {} for {} exceeds available {}",
            quantity, listing_id, record.quantity_available
        )));
    }

    record.quantity_available -= quantity;
    record.quantity_reserved -= quantity;
    touch(&mut record);
    store_inventory_record(txn, &record)?;
    set_reservation(txn, listing_id, cart_id, held - quantity)?;

    let seq = next_inventory_sequence(txn, listing_id)?;
    let entry = InventoryTransaction::new(
        listing_id.to_string(),
        seq,
        -quantity,
        InventoryTransactionType::Sale,
    )
    .with_cart(cart_id)
    .with_order(order_id)
    .with_actor(actor.audit_id());
    append_inventory_transaction(txn, &entry)?;

    if record.below_restock_threshold() {
        tracing::warn!(
            listing_id = %listing_id,
            quantity_available = record.quantity_available,
            restock_threshold = record.restock_threshold,
            "Listing fell below restock threshold"
        );
    }
    Ok(())
}

// ============================================================================
// InventoryLedger
// ============================================================================

/// Inventory ledger - the only writer of inventory records
#[derive(Clone)]
pub struct InventoryLedger {
    storage: EngineStorage,
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger").finish_non_exhaustive()
    }
}

impl InventoryLedger {
    pub fn new(storage: EngineStorage) -> Self {
        Self { storage }
    }

    /// Read a listing's record
    pub fn get(&self, listing_id: &str) -> LedgerResult<Option<InventoryRecord>> {
        Ok(self.storage.get_inventory_record(listing_id)?)
    }

    /// Read a listing's ledger log
    pub fn transactions(&self, listing_id: &str) -> LedgerResult<Vec<InventoryTransaction>> {
        Ok(self.storage.get_inventory_transactions(listing_id)?)
    }

    /// Atomically reserve stock for a cart
    pub fn reserve(
        &self,
        listing_id: &str,
        quantity: i64,
        cart_id: &str,
        actor: &ActorContext,
    ) -> LedgerResult<()> {
        let txn = self.storage.begin_write()?;
        reserve_in_txn(&txn, listing_id, quantity, cart_id, actor)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Release a cart's hold
    pub fn release(
        &self,
        listing_id: &str,
        quantity: i64,
        cart_id: &str,
        actor: &ActorContext,
    ) -> LedgerResult<i64> {
        let txn = self.storage.begin_write()?;
        let released = release_in_txn(&txn, listing_id, quantity, cart_id, actor)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(released)
    }

    /// Convert a reservation into a permanent decrement
    pub fn commit_consumption(
        &self,
        listing_id: &str,
        quantity: i64,
        cart_id: &str,
        order_id: &str,
        actor: &ActorContext,
    ) -> LedgerResult<()> {
        let txn = self.storage.begin_write()?;
        commit_consumption_in_txn(&txn, listing_id, quantity, cart_id, order_id, actor)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Set the absolute on-hand quantity, logging the signed delta
    ///
    /// Creates the record on first adjustment. A positive delta is a
    /// restock and stamps `last_restock_date`; a negative one is a manual
    /// adjustment.
    pub fn adjust_quantity(
        &self,
        listing_id: &str,
        new_available: i64,
        actor: &ActorContext,
    ) -> LedgerResult<InventoryRecord> {
        if new_available < 0 {
            return Err(LedgerError::InvalidQuantity(new_available));
        }
        let txn = self.storage.begin_write()?;
        let mut record = load_inventory_record(&txn, listing_id)?
            .unwrap_or_else(|| InventoryRecord::new(listing_id.to_string()));
        let delta = new_available - record.quantity_available;
        if delta == 0 {
            txn.abort().map_err(StorageError::from)?;
            return Ok(record);
        }
        if new_available < record.quantity_reserved {
            return Err(LedgerError::InvariantViolation(format!(
                "adjustment of {} below reserved {} for {}",
                new_available, record.quantity_reserved, listing_id
            )));
        }

        let transaction_type = if delta > 0 {
            record.last_restock_date = Some(chrono::Utc::now().timestamp_millis());
            InventoryTransactionType::Restock
        } else {
            InventoryTransactionType::Adjustment
        };
        record.quantity_available = new_available;
        touch(&mut record);
        store_inventory_record(&txn, &record)?;

        let seq = next_inventory_sequence(&txn, listing_id)?;
        let entry = InventoryTransaction::new(listing_id.to_string(), seq, delta, transaction_type)
            .with_actor(actor.audit_id());
        append_inventory_transaction(&txn, &entry)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(record)
    }

    /// Set the low-stock alerting threshold
    ///
    /// Configuration, not a stock movement - no log entry is appended.
    pub fn set_restock_threshold(
        &self,
        listing_id: &str,
        threshold: i64,
    ) -> LedgerResult<InventoryRecord> {
        if threshold < 0 {
            return Err(LedgerError::InvalidQuantity(threshold));
        }
        let txn = self.storage.begin_write()?;
        let mut record = require_record(&txn, listing_id)?;
        record.restock_threshold = threshold;
        touch(&mut record);
        store_inventory_record(&txn, &record)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(record)
    }

    /// Explicitly restock returned goods (never triggered by refunds)
    pub fn restock_returned(
        &self,
        listing_id: &str,
        quantity: i64,
        order_id: &str,
        actor: &ActorContext,
    ) -> LedgerResult<InventoryRecord> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        let txn = self.storage.begin_write()?;
        let mut record = require_record(&txn, listing_id)?;
        record.quantity_available += quantity;
        touch(&mut record);
        store_inventory_record(&txn, &record)?;

        let seq = next_inventory_sequence(&txn, listing_id)?;
        let entry = InventoryTransaction::new(
            listing_id.to_string(),
            seq,
            quantity,
            InventoryTransactionType::Return,
        )
        .with_order(order_id)
        .with_actor(actor.audit_id());
        append_inventory_transaction(&txn, &entry)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(record)
    }

    /// Replay the log and compare it against the record
    ///
    /// A mismatch (or reserved exceeding available) is ledger corruption:
    /// reported, alerted, never silently repaired.
    pub fn reconcile(&self, listing_id: &str) -> LedgerResult<ReconcileReport> {
        let record = self
            .get(listing_id)?
            .ok_or_else(|| LedgerError::RecordNotFound(listing_id.to_string()))?;
        let entries = self.transactions(listing_id)?;

        let mut replayed_available = 0i64;
        let mut reservation_sum = 0i64;
        for entry in &entries {
            match entry.transaction_type {
                InventoryTransactionType::Reservation => reservation_sum += entry.quantity_change,
                InventoryTransactionType::Restock
                | InventoryTransactionType::Adjustment
                | InventoryTransactionType::Return
                | InventoryTransactionType::Sale => replayed_available += entry.quantity_change,
            }
        }
        // Sales consumed their own holds; fold them back out of the
        // reservation balance.
        let sale_sum: i64 = entries
            .iter()
            .filter(|e| e.transaction_type == InventoryTransactionType::Sale)
            .map(|e| e.quantity_change)
            .sum();
        let replayed_reserved = -reservation_sum + sale_sum;

        let consistent = replayed_available == record.quantity_available
            && replayed_reserved == record.quantity_reserved
            && record.quantity_reserved >= 0
            && record.quantity_reserved <= record.quantity_available;

        let report = ReconcileReport {
            listing_id: listing_id.to_string(),
            recorded_available: record.quantity_available,
            recorded_reserved: record.quantity_reserved,
            replayed_available,
            replayed_reserved,
            consistent,
        };
        if !consistent {
            tracing::error!(
                listing_id = %listing_id,
                recorded_available = record.quantity_available,
                replayed_available,
                recorded_reserved = record.quantity_reserved,
                replayed_reserved,
                "Ledger reconciliation mismatch"
            );
        }
        Ok(report)
    }
}
