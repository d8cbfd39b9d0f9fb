//! Inventory domain types
//!
//! The inventory record is mutated only through ledger operations; every
//! mutation appends exactly one transaction entry, so the record can be
//! reconstructed from the log for reconciliation.

use serde::{Deserialize, Serialize};

/// Per-listing stock record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryRecord {
    pub listing_id: String,
    /// On-hand stock, >= 0
    pub quantity_available: i64,
    /// Stock held by active carts, >= 0
    pub quantity_reserved: i64,
    /// Alerting threshold for low stock
    #[serde(default)]
    pub restock_threshold: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_restock_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InventoryRecord {
    pub fn new(listing_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            listing_id,
            quantity_available: 0,
            quantity_reserved: 0,
            restock_threshold: 0,
            last_restock_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stock a new reservation can draw from
    pub fn available_to_purchase(&self) -> i64 {
        self.quantity_available - self.quantity_reserved
    }

    pub fn below_restock_threshold(&self) -> bool {
        self.restock_threshold > 0 && self.quantity_available <= self.restock_threshold
    }
}

/// Ledger entry type
///
/// `reservation` entries carry hold deltas (reserve negative, release
/// positive); `restock`/`adjustment`/`return`/`sale` entries carry
/// on-hand deltas. See the ledger for the replay identities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryTransactionType {
    /// Cart hold taken or released
    Reservation,
    /// Positive stock adjustment (sets last_restock_date)
    Restock,
    /// Manual stock correction
    Adjustment,
    /// Explicit restock of returned goods (never automatic on refund)
    Return,
    /// Reservation converted into a permanent decrement at payment
    Sale,
}

/// Immutable, append-only ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryTransaction {
    pub transaction_id: String,
    pub listing_id: String,
    /// Per-listing sequence, assigned by the ledger
    pub sequence: u64,
    /// Signed quantity delta; sign conventions per transaction_type
    pub quantity_change: i64,
    pub transaction_type: InventoryTransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: i64,
}

impl InventoryTransaction {
    pub fn new(
        listing_id: String,
        sequence: u64,
        quantity_change: i64,
        transaction_type: InventoryTransactionType,
    ) -> Self {
        Self {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            listing_id,
            sequence,
            quantity_change,
            transaction_type,
            cart_id: None,
            order_id: None,
            created_by: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_cart(mut self, cart_id: impl Into<String>) -> Self {
        self.cart_id = Some(cart_id.into());
        self
    }

    pub fn with_order(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.created_by = Some(actor_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_to_purchase_subtracts_holds() {
        let mut record = InventoryRecord::new("l1".into());
        record.quantity_available = 10;
        record.quantity_reserved = 3;
        assert_eq!(record.available_to_purchase(), 7);
    }

    #[test]
    fn threshold_check() {
        let mut record = InventoryRecord::new("l1".into());
        record.quantity_available = 2;
        record.restock_threshold = 5;
        assert!(record.below_restock_threshold());
        record.restock_threshold = 0;
        assert!(!record.below_restock_threshold());
    }
}
