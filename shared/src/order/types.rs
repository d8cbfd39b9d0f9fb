//! Shared types for the order state machine
//!
//! An order carries three independent status axes (`OrderStatus`,
//! `PaymentStatus`, `FulfillmentStatus`); transitions are driven by
//! external events, never by client choice.

use serde::{Deserialize, Serialize};

// ============================================================================
// Status Axes
// ============================================================================

/// Primary order status axis
///
/// pending → processing → shipped → delivered, with side exits to
/// cancelled / refunded / partially_refunded from any pre-delivered state,
/// and on_hold as a pause state re-enterable from pending/processing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    OnHold,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

impl OrderStatus {
    /// True before the order reaches a terminal state
    pub fn is_pre_delivered(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::OnHold
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

/// Payment status axis: unpaid → pending → paid → (refunded | failed)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Pending,
    Paid,
    Refunded,
    Failed,
}

/// Fulfillment status axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    Cancelled,
}

// ============================================================================
// Order Items
// ============================================================================

/// Refund progress on a single order item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemRefundStatus {
    Pending,
    Completed,
}

/// Immutable price/quantity snapshot taken from the cart at order creation
///
/// Later price changes to the listing never retroactively affect this item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemSnapshot {
    pub item_id: String,
    pub listing_id: String,
    pub name: String,
    pub quantity: i32,
    pub price_snapshot: f64,
    #[serde(default)]
    pub is_digital: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_status: Option<ItemRefundStatus>,
    #[serde(default)]
    pub refund_amount: f64,
}

impl OrderItemSnapshot {
    pub fn line_total(&self) -> f64 {
        self.price_snapshot * self.quantity as f64
    }
}

// ============================================================================
// Refunds
// ============================================================================

/// Refund decision state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// Customer-requested, awaiting store-owner approval
    Pending,
    /// Approved and applied to the order
    Approved,
}

/// A refund requested or applied against an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundRecord {
    pub refund_id: String,
    /// Set for item-scoped refunds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub amount: f64,
    pub reason: String,
    pub status: RefundStatus,
    /// Audit id of the requesting actor
    pub requested_by: String,
    pub requested_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<i64>,
}

// ============================================================================
// Shipments
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Delivered,
}

/// Item subset carried by one shipment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentItem {
    pub item_id: String,
    pub quantity: i32,
}

/// One physical shipment of an order-item subset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentRecord {
    pub shipment_id: String,
    pub items: Vec<ShipmentItem>,
    pub carrier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub status: ShipmentStatus,
    pub shipped_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
}

impl ShipmentRecord {
    pub fn is_delivered(&self) -> bool {
        self.status == ShipmentStatus::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_delivered_classification() {
        assert!(OrderStatus::Pending.is_pre_delivered());
        assert!(OrderStatus::Shipped.is_pre_delivered());
        assert!(!OrderStatus::Delivered.is_pre_delivered());
        assert!(!OrderStatus::Cancelled.is_pre_delivered());
    }

    #[test]
    fn item_line_total() {
        let item = OrderItemSnapshot {
            item_id: "i1".into(),
            listing_id: "l1".into(),
            name: "Widget".into(),
            quantity: 3,
            price_snapshot: 12.5,
            is_digital: false,
            refund_status: None,
            refund_amount: 0.0,
        };
        assert_eq!(item.line_total(), 37.5);
    }
}
