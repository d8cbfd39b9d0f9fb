//! Order commands - requests to mutate an order
//!
//! Commands are idempotent by `command_id`: replaying a processed command
//! returns a duplicate response without re-applying effects.

use super::snapshot::OrderSnapshot;
use super::types::ShipmentItem;
use crate::actor::ActorContext;
use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};

/// Outcome reported by the payment gateway callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Succeeded,
    Failed { reason: String },
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// Finalize a cart into an order (the single Cart → Order handoff)
    Checkout { cart_id: String },

    /// Attach a gateway payment intent to an order
    CreatePaymentIntent {
        order_id: String,
        intent_id: String,
        amount: f64,
    },

    /// Gateway callback reporting the payment result
    RecordPayment {
        order_id: String,
        intent_id: String,
        outcome: PaymentOutcome,
    },

    CreateShipment {
        order_id: String,
        items: Vec<ShipmentItem>,
        carrier: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        service: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tracking_number: Option<String>,
    },

    ConfirmDelivery {
        order_id: String,
        shipment_id: String,
    },

    CancelOrder {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    HoldOrder {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    ResumeOrder { order_id: String },

    RequestRefund {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
        amount: f64,
        reason: String,
    },

    ApproveRefund {
        order_id: String,
        refund_id: String,
    },
}

/// An order command with idempotency key and explicit actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Client-generated idempotency key
    pub command_id: String,
    pub actor: ActorContext,
    /// Client timestamp (Unix milliseconds) - audit only, may have clock skew
    pub timestamp: i64,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(actor: ActorContext, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }
}

/// Structured command error returned in responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        Self {
            code: err.code,
            message: err.message,
        }
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::with_message(err.code, err.message)
    }
}

/// Response to a processed command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command_id: String,
    pub success: bool,
    /// Set when the command resolved to an order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Snapshot after the command was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<OrderSnapshot>,
    /// True when the command_id had already been processed
    #[serde(default)]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn ok(command_id: String, snapshot: OrderSnapshot) -> Self {
        Self {
            command_id,
            success: true,
            order_id: Some(snapshot.order_id.clone()),
            snapshot: Some(snapshot),
            duplicate: false,
            error: None,
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            snapshot: None,
            duplicate: true,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            snapshot: None,
            duplicate: false,
            error: Some(error),
        }
    }
}
