//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles one event
//! type. Appliers are PURE functions over (snapshot, event).

use enum_dispatch::enum_dispatch;

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

mod lifecycle;
mod payment;
mod refund;
mod shipment;

pub use lifecycle::{
    OrderCancelledApplier, OrderCreatedApplier, OrderHeldApplier, OrderResumedApplier,
};
pub use payment::{PaymentFailedApplier, PaymentIntentCreatedApplier, PaymentReceivedApplier};
pub use refund::{RefundApprovedApplier, RefundRequestedApplier};
pub use shipment::{ShipmentCreatedApplier, ShipmentDeliveredApplier};

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderCreated(OrderCreatedApplier),
    OrderCancelled(OrderCancelledApplier),
    OrderHeld(OrderHeldApplier),
    OrderResumed(OrderResumedApplier),
    PaymentIntentCreated(PaymentIntentCreatedApplier),
    PaymentReceived(PaymentReceivedApplier),
    PaymentFailed(PaymentFailedApplier),
    ShipmentCreated(ShipmentCreatedApplier),
    ShipmentDelivered(ShipmentDeliveredApplier),
    RefundRequested(RefundRequestedApplier),
    RefundApproved(RefundApprovedApplier),
}

/// Convert an OrderEvent reference to its applier
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderCreated { .. } => EventAction::OrderCreated(OrderCreatedApplier),
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::OrderHeld { .. } => EventAction::OrderHeld(OrderHeldApplier),
            EventPayload::OrderResumed {} => EventAction::OrderResumed(OrderResumedApplier),
            EventPayload::PaymentIntentCreated { .. } => {
                EventAction::PaymentIntentCreated(PaymentIntentCreatedApplier)
            }
            EventPayload::PaymentReceived { .. } => {
                EventAction::PaymentReceived(PaymentReceivedApplier)
            }
            EventPayload::PaymentFailed { .. } => EventAction::PaymentFailed(PaymentFailedApplier),
            EventPayload::ShipmentCreated { .. } => {
                EventAction::ShipmentCreated(ShipmentCreatedApplier)
            }
            EventPayload::ShipmentDelivered { .. } => {
                EventAction::ShipmentDelivered(ShipmentDeliveredApplier)
            }
            EventPayload::RefundRequested { .. } => {
                EventAction::RefundRequested(RefundRequestedApplier)
            }
            EventPayload::RefundApproved { .. } => {
                EventAction::RefundApproved(RefundApprovedApplier)
            }
        }
    }
}

/// Common tail of every applier: bump bookkeeping and refresh the checksum
pub(crate) fn finish(snapshot: &mut OrderSnapshot, event: &OrderEvent) {
    snapshot.last_sequence = event.sequence;
    snapshot.updated_at = event.timestamp;
    snapshot.update_checksum();
}
