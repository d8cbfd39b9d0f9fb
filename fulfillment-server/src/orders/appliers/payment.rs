//! Payment event appliers

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus, PaymentStatus};

/// PaymentIntentCreated applier - unpaid → pending
pub struct PaymentIntentCreatedApplier;

impl EventApplier for PaymentIntentCreatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentIntentCreated { intent_id, .. } = &event.payload {
            snapshot.payment_intent_id = Some(intent_id.clone());
            snapshot.payment_status = PaymentStatus::Pending;
            finish(snapshot, event);
        }
    }
}

/// PaymentReceived applier - pending → paid, order starts processing
///
/// The matching ledger consumption is committed in the same storage
/// transaction by the RecordPayment action; the applier only folds state.
pub struct PaymentReceivedApplier;

impl EventApplier for PaymentReceivedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentReceived { .. } = &event.payload {
            snapshot.payment_status = PaymentStatus::Paid;
            match snapshot.status {
                OrderStatus::Pending => snapshot.status = OrderStatus::Processing,
                OrderStatus::OnHold => {
                    // Paused orders resume into processing
                    snapshot.held_from = Some(OrderStatus::Processing);
                }
                _ => {}
            }
            snapshot.fulfillment_status = snapshot.computed_fulfillment();
            finish(snapshot, event);
        }
    }
}

/// PaymentFailed applier
pub struct PaymentFailedApplier;

impl EventApplier for PaymentFailedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentFailed { .. } = &event.payload {
            snapshot.payment_status = PaymentStatus::Failed;
            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{FulfillmentStatus, OrderEventType, OrderItemSnapshot};

    fn event(sequence: u64, event_type: OrderEventType, payload: EventPayload) -> OrderEvent {
        OrderEvent::new(
            sequence,
            "order-1".into(),
            "system".into(),
            None,
            "cmd-1".into(),
            None,
            event_type,
            payload,
        )
    }

    #[test]
    fn payment_received_moves_both_axes() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.payment_status = PaymentStatus::Pending;

        PaymentReceivedApplier.apply(
            &mut snapshot,
            &event(
                3,
                OrderEventType::PaymentReceived,
                EventPayload::PaymentReceived {
                    intent_id: "pi_1".into(),
                    amount: 90.0,
                },
            ),
        );
        assert_eq!(snapshot.payment_status, PaymentStatus::Paid);
        assert_eq!(snapshot.status, OrderStatus::Processing);
        assert_eq!(snapshot.last_sequence, 3);
    }

    #[test]
    fn digital_order_fulfills_at_payment() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.items = vec![OrderItemSnapshot {
            item_id: "i1".into(),
            listing_id: "l1".into(),
            name: "E-book".into(),
            quantity: 1,
            price_snapshot: 9.0,
            is_digital: true,
            refund_status: None,
            refund_amount: 0.0,
        }];

        PaymentReceivedApplier.apply(
            &mut snapshot,
            &event(
                2,
                OrderEventType::PaymentReceived,
                EventPayload::PaymentReceived {
                    intent_id: "pi_1".into(),
                    amount: 9.0,
                },
            ),
        );
        assert_eq!(snapshot.fulfillment_status, FulfillmentStatus::Fulfilled);
    }

    #[test]
    fn payment_failed_only_touches_payment_axis() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.payment_status = PaymentStatus::Pending;

        PaymentFailedApplier.apply(
            &mut snapshot,
            &event(
                2,
                OrderEventType::PaymentFailed,
                EventPayload::PaymentFailed {
                    intent_id: "pi_1".into(),
                    reason: "card declined".into(),
                },
            ),
        );
        assert_eq!(snapshot.payment_status, PaymentStatus::Failed);
        assert_eq!(snapshot.status, OrderStatus::Pending);
    }
}
