//! Lifecycle event appliers: created, cancelled, held, resumed

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, FulfillmentStatus, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderCreated applier - fills the snapshot shell from the cart freeze
pub struct OrderCreatedApplier;

impl EventApplier for OrderCreatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCreated {
            cart_id,
            order_number,
            owner,
            currency,
            items,
            coupons,
            shipping,
            subtotal,
            total_discounts,
            total_shipping,
            total_tax,
            total_price,
        } = &event.payload
        {
            snapshot.cart_id = cart_id.clone();
            snapshot.order_number = order_number.clone();
            snapshot.owner = owner.clone();
            snapshot.currency = currency.clone();
            snapshot.items = items.clone();
            snapshot.coupons = coupons.clone();
            snapshot.shipping = shipping.clone();
            snapshot.subtotal = *subtotal;
            snapshot.total_discounts = *total_discounts;
            snapshot.total_shipping = *total_shipping;
            snapshot.total_tax = *total_tax;
            snapshot.total_price = *total_price;
            snapshot.status = OrderStatus::Pending;
            snapshot.payment_status = shared::order::PaymentStatus::Unpaid;
            snapshot.fulfillment_status = FulfillmentStatus::Unfulfilled;
            snapshot.created_at = event.timestamp;

            finish(snapshot, event);
        }
    }
}

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled { .. } = &event.payload {
            snapshot.status = OrderStatus::Cancelled;
            snapshot.fulfillment_status = FulfillmentStatus::Cancelled;
            snapshot.held_from = None;
            finish(snapshot, event);
        }
    }
}

/// OrderHeld applier - pauses the primary axis, remembering where from
pub struct OrderHeldApplier;

impl EventApplier for OrderHeldApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderHeld { .. } = &event.payload {
            snapshot.held_from = Some(snapshot.status);
            snapshot.status = OrderStatus::OnHold;
            finish(snapshot, event);
        }
    }
}

/// OrderResumed applier - restores the pre-hold status
pub struct OrderResumedApplier;

impl EventApplier for OrderResumedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderResumed {} = &event.payload {
            snapshot.status = snapshot.held_from.take().unwrap_or(OrderStatus::Pending);
            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderEventType;

    fn event(sequence: u64, event_type: OrderEventType, payload: EventPayload) -> OrderEvent {
        OrderEvent::new(
            sequence,
            "order-1".into(),
            "acc-1".into(),
            None,
            "cmd-1".into(),
            None,
            event_type,
            payload,
        )
    }

    #[test]
    fn hold_and_resume_restore_status() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.status = OrderStatus::Processing;

        OrderHeldApplier.apply(
            &mut snapshot,
            &event(1, OrderEventType::OrderHeld, EventPayload::OrderHeld { reason: None }),
        );
        assert_eq!(snapshot.status, OrderStatus::OnHold);
        assert_eq!(snapshot.held_from, Some(OrderStatus::Processing));

        OrderResumedApplier.apply(
            &mut snapshot,
            &event(2, OrderEventType::OrderResumed, EventPayload::OrderResumed {}),
        );
        assert_eq!(snapshot.status, OrderStatus::Processing);
        assert!(snapshot.held_from.is_none());
        assert_eq!(snapshot.last_sequence, 2);
    }

    #[test]
    fn cancel_cancels_fulfillment_axis_too() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        OrderCancelledApplier.apply(
            &mut snapshot,
            &event(
                1,
                OrderEventType::OrderCancelled,
                EventPayload::OrderCancelled {
                    reason: Some("no stock".into()),
                    released_reservations: true,
                },
            ),
        );
        assert_eq!(snapshot.status, OrderStatus::Cancelled);
        assert_eq!(snapshot.fulfillment_status, FulfillmentStatus::Cancelled);
        assert!(snapshot.verify_checksum());
    }
}
