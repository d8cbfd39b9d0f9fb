//! Refund event appliers

use super::finish;
use crate::orders::money;
use crate::orders::traits::EventApplier;
use shared::order::{
    EventPayload, ItemRefundStatus, OrderEvent, OrderSnapshot, OrderStatus, PaymentStatus,
    RefundStatus,
};

/// RefundRequested applier - records the pending refund
pub struct RefundRequestedApplier;

impl EventApplier for RefundRequestedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::RefundRequested { refund } = &event.payload {
            if let Some(item_id) = &refund.item_id
                && let Some(item) = snapshot.items.iter_mut().find(|i| &i.item_id == item_id)
            {
                item.refund_status = Some(ItemRefundStatus::Pending);
            }
            snapshot.refunds.push(refund.clone());
            finish(snapshot, event);
        }
    }
}

/// RefundApproved applier - applies the amount to the order
pub struct RefundApprovedApplier;

impl EventApplier for RefundApprovedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::RefundApproved {
            refund_id,
            amount,
            item_id,
            full_refund,
        } = &event.payload
        {
            if let Some(refund) = snapshot
                .refunds
                .iter_mut()
                .find(|r| &r.refund_id == refund_id)
            {
                refund.status = RefundStatus::Approved;
                refund.decided_at = Some(event.timestamp);
            }
            snapshot.refund_total = money::add(snapshot.refund_total, *amount);
            if let Some(item_id) = item_id
                && let Some(item) = snapshot.items.iter_mut().find(|i| &i.item_id == item_id)
            {
                item.refund_status = Some(ItemRefundStatus::Completed);
                item.refund_amount = money::add(item.refund_amount, *amount);
            }
            if *full_refund {
                snapshot.status = OrderStatus::Refunded;
                snapshot.payment_status = PaymentStatus::Refunded;
            } else {
                snapshot.status = OrderStatus::PartiallyRefunded;
            }
            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderEventType, OrderItemSnapshot, RefundRecord};

    fn event(sequence: u64, event_type: OrderEventType, payload: EventPayload) -> OrderEvent {
        OrderEvent::new(
            sequence,
            "order-1".into(),
            "owner-1".into(),
            None,
            "cmd-1".into(),
            None,
            event_type,
            payload,
        )
    }

    fn paid_snapshot() -> OrderSnapshot {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.status = OrderStatus::Processing;
        snapshot.payment_status = PaymentStatus::Paid;
        snapshot.total_price = 90.0;
        snapshot.items = vec![OrderItemSnapshot {
            item_id: "i1".into(),
            listing_id: "l1".into(),
            name: "Mug".into(),
            quantity: 2,
            price_snapshot: 45.0,
            is_digital: false,
            refund_status: None,
            refund_amount: 0.0,
        }];
        snapshot
    }

    fn refund(refund_id: &str, amount: f64, item_id: Option<&str>) -> RefundRecord {
        RefundRecord {
            refund_id: refund_id.into(),
            item_id: item_id.map(|s| s.to_string()),
            amount,
            reason: "damaged".into(),
            status: RefundStatus::Pending,
            requested_by: "acc-1".into(),
            requested_at: 0,
            decided_at: None,
        }
    }

    #[test]
    fn partial_item_refund() {
        let mut snapshot = paid_snapshot();
        RefundRequestedApplier.apply(
            &mut snapshot,
            &event(
                5,
                OrderEventType::RefundRequested,
                EventPayload::RefundRequested {
                    refund: refund("r1", 45.0, Some("i1")),
                },
            ),
        );
        assert_eq!(
            snapshot.items[0].refund_status,
            Some(ItemRefundStatus::Pending)
        );

        RefundApprovedApplier.apply(
            &mut snapshot,
            &event(
                6,
                OrderEventType::RefundApproved,
                EventPayload::RefundApproved {
                    refund_id: "r1".into(),
                    amount: 45.0,
                    item_id: Some("i1".into()),
                    full_refund: false,
                },
            ),
        );
        assert_eq!(snapshot.status, OrderStatus::PartiallyRefunded);
        assert_eq!(snapshot.payment_status, PaymentStatus::Paid);
        assert_eq!(snapshot.refund_total, 45.0);
        assert_eq!(
            snapshot.items[0].refund_status,
            Some(ItemRefundStatus::Completed)
        );
        assert_eq!(snapshot.items[0].refund_amount, 45.0);
        assert_eq!(snapshot.refundable_balance(), 45.0);
    }

    #[test]
    fn full_refund_flips_both_axes() {
        let mut snapshot = paid_snapshot();
        RefundRequestedApplier.apply(
            &mut snapshot,
            &event(
                5,
                OrderEventType::RefundRequested,
                EventPayload::RefundRequested {
                    refund: refund("r1", 90.0, None),
                },
            ),
        );
        RefundApprovedApplier.apply(
            &mut snapshot,
            &event(
                6,
                OrderEventType::RefundApproved,
                EventPayload::RefundApproved {
                    refund_id: "r1".into(),
                    amount: 90.0,
                    item_id: None,
                    full_refund: true,
                },
            ),
        );
        assert_eq!(snapshot.status, OrderStatus::Refunded);
        assert_eq!(snapshot.payment_status, PaymentStatus::Refunded);
        assert_eq!(snapshot.refunds[0].status, RefundStatus::Approved);
        assert!(snapshot.refunds[0].decided_at.is_some());
        assert_eq!(snapshot.refundable_balance(), 0.0);
    }
}
