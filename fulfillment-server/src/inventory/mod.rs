//! Inventory ledger
//!
//! Tracks available/reserved stock per listing and exposes reserve /
//! release / adjust / commit-consumption / restock as atomic, idempotent
//! primitives. Every mutation appends exactly one transaction log entry;
//! reconciliation replays the log against the record.

pub mod ledger;

pub use ledger::{InventoryLedger, LedgerError, LedgerResult, ReconcileReport};
