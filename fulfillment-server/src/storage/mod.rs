//! redb-based storage layer for all fulfillment state
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `inventory_records` | `listing_id` | `InventoryRecord` | Stock per listing |
//! | `inventory_transactions` | `(listing_id, seq)` | `InventoryTransaction` | Append-only ledger log |
//! | `inventory_sequences` | `listing_id` | `u64` | Per-listing log sequence |
//! | `reservations` | `(listing_id, cart_id)` | `i64` | Per-cart holds |
//! | `carts` | `cart_id` | `CartSnapshot` | Cart aggregates |
//! | `cart_owner_index` | `owner_key` | `cart_id` | One active cart per owner |
//! | `cart_events` | `(cart_id, seq)` | `CartEvent` | Cart audit trail (append-only) |
//! | `order_events` | `(order_id, seq)` | `OrderEvent` | Event stream (append-only) |
//! | `order_snapshots` | `order_id` | `OrderSnapshot` | Snapshot cache |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `coupon_usage` | `(coupon_id, account_key)` | `u32` | Checkout usage counts |
//! | `counters` | `name` | `u64` | Global sequence, order count |
//!
//! # Atomicity
//!
//! Helpers operate on a caller-supplied [`WriteTransaction`] so that
//! multi-entity operations - a cart mutation with its reservation delta, a
//! checkout converting a cart, a payment committing consumption - land in a
//! single transaction. redb write transactions are serialized, which also
//! gives the ledger its per-listing check-then-write atomicity.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: copy-on-write with
//! an atomic pointer swap, so the database file stays consistent across
//! crashes and power loss.

mod carts;
mod inventory;
mod orders;

pub use carts::*;
pub use inventory::*;
pub use orders::*;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

// ========== Inventory ==========

/// Stock records: key = listing_id, value = JSON-serialized InventoryRecord
pub(crate) const INVENTORY_RECORDS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("inventory_records");

/// Ledger log: key = (listing_id, seq), value = JSON-serialized InventoryTransaction
pub(crate) const INVENTORY_TRANSACTIONS: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("inventory_transactions");

/// Per-listing log sequence: key = listing_id, value = last sequence
pub(crate) const INVENTORY_SEQUENCES: TableDefinition<&str, u64> =
    TableDefinition::new("inventory_sequences");

/// Per-cart holds: key = (listing_id, cart_id), value = reserved quantity
pub(crate) const RESERVATIONS: TableDefinition<(&str, &str), i64> =
    TableDefinition::new("reservations");

// ========== Carts ==========

/// Cart aggregates: key = cart_id, value = JSON-serialized CartSnapshot
pub(crate) const CARTS: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

/// Active-cart uniqueness index: key = owner key, value = cart_id
pub(crate) const CART_OWNER_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("cart_owner_index");

/// Cart audit trail: key = (cart_id, seq), value = JSON-serialized CartEvent
pub(crate) const CART_EVENTS: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("cart_events");

// ========== Orders ==========

/// Event stream: key = (order_id, sequence), value = JSON-serialized OrderEvent
pub(crate) const ORDER_EVENTS: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("order_events");

/// Snapshot cache: key = order_id, value = JSON-serialized OrderSnapshot
pub(crate) const ORDER_SNAPSHOTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("order_snapshots");

/// Idempotency: key = command_id, value = empty
pub(crate) const PROCESSED_COMMANDS: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Coupon usage counts: key = (coupon_id, account_key), value = count
pub(crate) const COUPON_USAGE: TableDefinition<(&str, &str), u32> =
    TableDefinition::new("coupon_usage");

/// Counters: key = "seq" (global event sequence) or "order_count"
pub(crate) const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub(crate) const SEQUENCE_KEY: &str = "seq";
pub(crate) const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cart not found: {0}")]
    CartNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::CartNotFound(id) => shared::AppError::not_found(format!("Cart {}", id)),
            StorageError::OrderNotFound(id) => {
                shared::AppError::not_found(format!("Order {}", id))
            }
            _ => shared::AppError::storage(err.to_string()),
        }
    }
}

/// Engine storage backed by a single redb database
///
/// All fulfillment state shares one database so cross-entity operations can
/// commit atomically.
#[derive(Clone)]
pub struct EngineStorage {
    db: Arc<Database>,
}

impl EngineStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (tests, ephemeral dev runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Create all tables and seed counters
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(INVENTORY_RECORDS)?;
            let _ = write_txn.open_table(INVENTORY_TRANSACTIONS)?;
            let _ = write_txn.open_table(INVENTORY_SEQUENCES)?;
            let _ = write_txn.open_table(RESERVATIONS)?;
            let _ = write_txn.open_table(CARTS)?;
            let _ = write_txn.open_table(CART_OWNER_INDEX)?;
            let _ = write_txn.open_table(CART_EVENTS)?;
            let _ = write_txn.open_table(ORDER_EVENTS)?;
            let _ = write_txn.open_table(ORDER_SNAPSHOTS)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS)?;
            let _ = write_txn.open_table(COUPON_USAGE)?;

            let mut counters = write_txn.open_table(COUNTERS)?;
            if counters.get(SEQUENCE_KEY)?.is_none() {
                counters.insert(SEQUENCE_KEY, 0u64)?;
            }
            if counters.get(ORDER_COUNT_KEY)?.is_none() {
                counters.insert(ORDER_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    // ========== Counters ==========

    /// Increment and return the global event sequence number
    pub fn increment_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS)?;
        let current = table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(SEQUENCE_KEY, next)?;
        Ok(next)
    }

    /// Get current global sequence (read-only)
    pub fn current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(COUNTERS)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Increment and return the order count (crash-safe order numbering)
    pub fn next_order_count(&self) -> StorageResult<u64> {
        let write_txn = self.begin_write()?;
        let next = {
            let mut table = write_txn.open_table(COUNTERS)?;
            let current = table
                .get(ORDER_COUNT_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0);
            let next = current + 1;
            table.insert(ORDER_COUNT_KEY, next)?;
            next
        };
        write_txn.commit()?;
        Ok(next)
    }
}

impl std::fmt::Debug for EngineStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineStorage").finish_non_exhaustive()
    }
}
