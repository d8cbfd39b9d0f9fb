//! Event replay and snapshot computation
//!
//! The event log is the canonical history; the reducer folds it back into
//! a snapshot. Cached snapshots are an optimization - replay must always
//! reproduce them, and the verify pass checks that it does.

use super::appliers::EventAction;
use super::traits::EventApplier;
use shared::order::{OrderEvent, OrderSnapshot};

/// Replay an ordered event stream into a snapshot
pub fn replay(order_id: &str, events: &[OrderEvent]) -> OrderSnapshot {
    let mut snapshot = OrderSnapshot::new(order_id.to_string());
    for event in events {
        EventAction::from(event).apply(&mut snapshot, event);
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::CartOwner;
    use shared::order::{
        EventPayload, OrderEventType, OrderItemSnapshot, OrderStatus, PaymentStatus,
    };

    fn event(sequence: u64, event_type: OrderEventType, payload: EventPayload) -> OrderEvent {
        OrderEvent::new(
            sequence,
            "order-1".into(),
            "acc-1".into(),
            None,
            format!("cmd-{sequence}"),
            None,
            event_type,
            payload,
        )
    }

    fn created_event() -> OrderEvent {
        event(
            1,
            OrderEventType::OrderCreated,
            EventPayload::OrderCreated {
                cart_id: "cart-1".into(),
                order_number: "ORD202601011001".into(),
                owner: CartOwner::Account {
                    account_id: "acc-1".into(),
                },
                currency: "USD".into(),
                items: vec![OrderItemSnapshot {
                    item_id: "i1".into(),
                    listing_id: "l1".into(),
                    name: "Mug".into(),
                    quantity: 2,
                    price_snapshot: 45.0,
                    is_digital: false,
                    refund_status: None,
                    refund_amount: 0.0,
                }],
                coupons: vec![],
                shipping: None,
                subtotal: 90.0,
                total_discounts: 0.0,
                total_shipping: 0.0,
                total_tax: 0.0,
                total_price: 90.0,
            },
        )
    }

    #[test]
    fn replay_reconstructs_status_from_events() {
        let events = vec![
            created_event(),
            event(
                2,
                OrderEventType::PaymentIntentCreated,
                EventPayload::PaymentIntentCreated {
                    intent_id: "pi_1".into(),
                    amount: 90.0,
                },
            ),
            event(
                3,
                OrderEventType::PaymentReceived,
                EventPayload::PaymentReceived {
                    intent_id: "pi_1".into(),
                    amount: 90.0,
                },
            ),
        ];

        let snapshot = replay("order-1", &events);
        assert_eq!(snapshot.order_number, "ORD202601011001");
        assert_eq!(snapshot.status, OrderStatus::Processing);
        assert_eq!(snapshot.payment_status, PaymentStatus::Paid);
        assert_eq!(snapshot.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(snapshot.last_sequence, 3);
        assert!(snapshot.verify_checksum());
    }

    #[test]
    fn replay_is_deterministic() {
        let events = vec![created_event()];
        let a = replay("order-1", &events);
        let mut b = replay("order-1", &events);
        // created_at comes from the event timestamp, so snapshots agree
        b.state_checksum = b.compute_checksum();
        assert_eq!(a.state_checksum, b.state_checksum);
        assert_eq!(a.total_price, b.total_price);
    }
}
