//! Order snapshot - computed state from the event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection:
//! replaying the event log must reproduce the cached snapshot, and the
//! verify pass compares checksums to catch reducer divergence.

use super::types::{
    FulfillmentStatus, OrderItemSnapshot, OrderStatus, PaymentStatus, RefundRecord, ShipmentRecord,
};
use crate::cart::{CartCoupon, CartOwner, CartShippingOption};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Order snapshot - computed from the event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by server)
    pub order_id: String,
    /// Human-facing order number, immutable after creation
    pub order_number: String,
    /// Cart this order was created from (reservations stay keyed to it
    /// until consumption commits)
    pub cart_id: String,
    pub owner: CartOwner,
    pub currency: String,

    // ========== Status Axes ==========
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    /// Status to restore when an on-hold order resumes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held_from: Option<OrderStatus>,

    // ========== Contents ==========
    pub items: Vec<OrderItemSnapshot>,
    /// Coupons as applied at checkout (audit)
    #[serde(default)]
    pub coupons: Vec<CartCoupon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<CartShippingOption>,
    #[serde(default)]
    pub shipments: Vec<ShipmentRecord>,
    #[serde(default)]
    pub refunds: Vec<RefundRecord>,

    // ========== Money (frozen from the cart) ==========
    pub subtotal: f64,
    pub total_discounts: f64,
    pub total_shipping: f64,
    pub total_tax: f64,
    pub total_price: f64,
    /// Sum of approved refund amounts
    #[serde(default)]
    pub refund_total: f64,

    // ========== Payment ==========
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    // ========== Bookkeeping ==========
    pub created_at: i64,
    pub updated_at: i64,
    /// Last applied event sequence (for incremental updates)
    pub last_sequence: u64,
    /// State checksum for drift detection (hex string)
    #[serde(default)]
    pub state_checksum: String,
}

impl OrderSnapshot {
    /// Create an empty snapshot shell; the OrderCreated applier fills it
    pub fn new(order_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut snapshot = Self {
            order_id,
            order_number: String::new(),
            cart_id: String::new(),
            owner: CartOwner::Account {
                account_id: String::new(),
            },
            currency: String::new(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            fulfillment_status: FulfillmentStatus::Unfulfilled,
            held_from: None,
            items: Vec::new(),
            coupons: Vec::new(),
            shipping: None,
            shipments: Vec::new(),
            refunds: Vec::new(),
            subtotal: 0.0,
            total_discounts: 0.0,
            total_shipping: 0.0,
            total_tax: 0.0,
            total_price: 0.0,
            refund_total: 0.0,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItemSnapshot> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn shipment(&self, shipment_id: &str) -> Option<&ShipmentRecord> {
        self.shipments.iter().find(|s| s.shipment_id == shipment_id)
    }

    pub fn refund(&self, refund_id: &str) -> Option<&RefundRecord> {
        self.refunds.iter().find(|r| r.refund_id == refund_id)
    }

    /// Amount still refundable against this order
    pub fn refundable_balance(&self) -> f64 {
        (self.total_price - self.refund_total).max(0.0)
    }

    /// Quantity of an item already allocated to shipments
    pub fn shipped_quantity(&self, item_id: &str) -> i32 {
        self.shipments
            .iter()
            .flat_map(|s| s.items.iter())
            .filter(|i| i.item_id == item_id)
            .map(|i| i.quantity)
            .sum()
    }

    /// True when every shipment (and there is at least one) is delivered
    pub fn all_shipments_delivered(&self) -> bool {
        !self.shipments.is_empty() && self.shipments.iter().all(|s| s.is_delivered())
    }

    /// Recompute the fulfillment axis from shipped quantities
    ///
    /// Digital items fulfill on payment and are excluded from the physical
    /// accounting here.
    pub fn computed_fulfillment(&self) -> FulfillmentStatus {
        if self.fulfillment_status == FulfillmentStatus::Cancelled {
            return FulfillmentStatus::Cancelled;
        }
        let physical: Vec<&OrderItemSnapshot> =
            self.items.iter().filter(|i| !i.is_digital).collect();
        if physical.is_empty() {
            // All-digital orders fulfill at payment
            return if self.is_paid() {
                FulfillmentStatus::Fulfilled
            } else {
                FulfillmentStatus::Unfulfilled
            };
        }
        let mut any_shipped = false;
        let mut all_shipped = true;
        for item in physical {
            let shipped = self.shipped_quantity(&item.item_id);
            if shipped > 0 {
                any_shipped = true;
            }
            if shipped < item.quantity {
                all_shipped = false;
            }
        }
        match (any_shipped, all_shipped) {
            (_, true) => FulfillmentStatus::Fulfilled,
            (true, false) => FulfillmentStatus::PartiallyFulfilled,
            (false, false) => FulfillmentStatus::Unfulfilled,
        }
    }

    /// Compute state checksum for drift detection
    ///
    /// The checksum is computed from key state fields that must match after
    /// replaying the same events. Returns a 16-character hex string.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();

        self.items.len().hash(&mut hasher);
        // Money in cents to avoid float precision issues
        ((self.total_price * 100.0).round() as i64).hash(&mut hasher);
        ((self.refund_total * 100.0).round() as i64).hash(&mut hasher);
        self.shipments.len().hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        (self.status as u8).hash(&mut hasher);
        (self.payment_status as u8).hash(&mut hasher);
        (self.fulfillment_status as u8).hash(&mut hasher);

        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Verify that the cached checksum matches the computed one
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::types::{ShipmentItem, ShipmentStatus};

    fn item(item_id: &str, quantity: i32, digital: bool) -> OrderItemSnapshot {
        OrderItemSnapshot {
            item_id: item_id.to_string(),
            listing_id: format!("listing-{}", item_id),
            name: item_id.to_string(),
            quantity,
            price_snapshot: 10.0,
            is_digital: digital,
            refund_status: None,
            refund_amount: 0.0,
        }
    }

    fn shipment(id: &str, item_id: &str, quantity: i32) -> ShipmentRecord {
        ShipmentRecord {
            shipment_id: id.to_string(),
            items: vec![ShipmentItem {
                item_id: item_id.to_string(),
                quantity,
            }],
            carrier: "UPS".to_string(),
            service: None,
            tracking_number: None,
            status: ShipmentStatus::Pending,
            shipped_at: 0,
            delivered_at: None,
        }
    }

    #[test]
    fn fulfillment_tracks_shipped_quantities() {
        let mut snapshot = OrderSnapshot::new("o1".into());
        snapshot.items = vec![item("a", 2, false), item("b", 1, false)];
        assert_eq!(snapshot.computed_fulfillment(), FulfillmentStatus::Unfulfilled);

        snapshot.shipments.push(shipment("s1", "a", 2));
        assert_eq!(
            snapshot.computed_fulfillment(),
            FulfillmentStatus::PartiallyFulfilled
        );

        snapshot.shipments.push(shipment("s2", "b", 1));
        assert_eq!(snapshot.computed_fulfillment(), FulfillmentStatus::Fulfilled);
    }

    #[test]
    fn digital_items_fulfill_on_payment() {
        let mut snapshot = OrderSnapshot::new("o1".into());
        snapshot.items = vec![item("a", 1, true)];
        assert_eq!(snapshot.computed_fulfillment(), FulfillmentStatus::Unfulfilled);
        snapshot.payment_status = PaymentStatus::Paid;
        assert_eq!(snapshot.computed_fulfillment(), FulfillmentStatus::Fulfilled);
    }

    #[test]
    fn checksum_changes_with_state() {
        let mut snapshot = OrderSnapshot::new("o1".into());
        let before = snapshot.compute_checksum();
        snapshot.total_price = 99.0;
        snapshot.last_sequence = 5;
        assert_ne!(before, snapshot.compute_checksum());
    }

    #[test]
    fn refundable_balance_floors_at_zero() {
        let mut snapshot = OrderSnapshot::new("o1".into());
        snapshot.total_price = 50.0;
        snapshot.refund_total = 60.0;
        assert_eq!(snapshot.refundable_balance(), 0.0);
    }
}
