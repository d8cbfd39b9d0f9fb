//! Order domain types - commands, events, snapshots
//!
//! The order state machine is event sourced: commands are validated into
//! events, events are folded into snapshots, and the event log remains the
//! canonical history.

pub mod command;
pub mod event;
pub mod snapshot;
pub mod types;

pub use command::{CommandError, CommandResponse, OrderCommand, OrderCommandPayload, PaymentOutcome};
pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use snapshot::OrderSnapshot;
pub use types::{
    FulfillmentStatus, ItemRefundStatus, OrderItemSnapshot, OrderStatus, PaymentStatus,
    RefundRecord, RefundStatus, ShipmentItem, ShipmentRecord, ShipmentStatus,
};
