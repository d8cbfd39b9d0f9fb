//! Order events - immutable facts recorded after command processing
//!
//! The event log is the canonical history: the reducer must be able to
//! reconstruct the current snapshot from it, even though the snapshot is
//! also cached for fast reads.

use super::types::{OrderItemSnapshot, RefundRecord, ShipmentRecord};
use crate::cart::{CartCoupon, CartOwner, CartShippingOption};
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds) - AUTHORITATIVE for state evolution
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds) - audit only, may have clock skew
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Audit id of the actor who triggered this event
    pub actor_id: String,
    /// Actor display name (snapshot for audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    // Lifecycle
    OrderCreated,
    OrderCancelled,
    OrderHeld,
    OrderResumed,

    // Payments
    PaymentIntentCreated,
    PaymentReceived,
    PaymentFailed,

    // Fulfillment
    ShipmentCreated,
    ShipmentDelivered,

    // Refunds
    RefundRequested,
    RefundApproved,
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    OrderCreated {
        cart_id: String,
        /// Server-generated order number (always present)
        order_number: String,
        owner: CartOwner,
        currency: String,
        /// Complete item snapshots frozen from the cart
        items: Vec<OrderItemSnapshot>,
        /// Coupons as applied at checkout (audit)
        coupons: Vec<CartCoupon>,
        /// Selected shipping option, None for all-digital orders
        #[serde(skip_serializing_if = "Option::is_none")]
        shipping: Option<CartShippingOption>,
        subtotal: f64,
        total_discounts: f64,
        total_shipping: f64,
        total_tax: f64,
        total_price: f64,
    },

    OrderCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Whether the cancel released outstanding reservations
        released_reservations: bool,
    },

    OrderHeld {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    OrderResumed {},

    // ========== Payments ==========
    PaymentIntentCreated {
        intent_id: String,
        amount: f64,
    },

    PaymentReceived {
        intent_id: String,
        amount: f64,
    },

    PaymentFailed {
        intent_id: String,
        reason: String,
    },

    // ========== Fulfillment ==========
    ShipmentCreated {
        shipment: ShipmentRecord,
    },

    ShipmentDelivered {
        shipment_id: String,
    },

    // ========== Refunds ==========
    RefundRequested {
        refund: RefundRecord,
    },

    RefundApproved {
        refund_id: String,
        amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
        /// True when the approved total covers the full order price
        full_refund: bool,
    },
}

impl OrderEvent {
    /// Create a new event
    ///
    /// The server timestamp is always set here - it is authoritative for
    /// state evolution; the client timestamp is preserved for audit only.
    pub fn new(
        sequence: u64,
        order_id: String,
        actor_id: String,
        actor_name: Option<String>,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_timestamp,
            actor_id,
            actor_name,
            command_id,
            event_type,
            payload,
        }
    }

    /// Create an event from a command (extracts actor and client timestamp)
    pub fn from_command(
        sequence: u64,
        order_id: String,
        command: &super::OrderCommand,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            sequence,
            order_id,
            command.actor.audit_id(),
            command.actor.actor_name.clone(),
            command.command_id.clone(),
            Some(command.timestamp),
            event_type,
            payload,
        )
    }
}
