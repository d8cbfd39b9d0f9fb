//! RequestRefund command handler
//!
//! Customers create refunds pending store-owner approval; store owners
//! create pre-approved refunds that apply immediately (two events, one
//! command). Refunds never restock inventory.

use crate::orders::money;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, authorize_order,
};
use shared::order::{
    EventPayload, OrderEvent, OrderEventType, PaymentStatus, RefundRecord, RefundStatus,
};

#[derive(Debug, Clone)]
pub struct RequestRefundAction {
    pub order_id: String,
    pub item_id: Option<String>,
    pub amount: f64,
    pub reason: String,
}

impl CommandHandler for RequestRefundAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        authorize_order(&snapshot, &metadata.actor)?;

        if snapshot.payment_status != PaymentStatus::Paid {
            return Err(OrderError::NotPaid(self.order_id.clone()));
        }
        money::validate_amount(self.amount, "refund amount").map_err(OrderError::Validation)?;
        if self.reason.trim().is_empty() {
            return Err(OrderError::Validation("refund reason must not be empty".into()));
        }

        // Never exceed what is still refundable - rejected whole, never
        // partially applied
        let balance = snapshot.refundable_balance();
        if self.amount > balance + money::MONEY_TOLERANCE {
            return Err(OrderError::RefundExceedsBalance {
                requested: self.amount,
                balance,
            });
        }

        if let Some(item_id) = &self.item_id {
            let item = snapshot
                .item(item_id)
                .ok_or_else(|| OrderError::Validation(format!("unknown item {}", item_id)))?;
            let item_balance = item.line_total() - item.refund_amount;
            if self.amount > item_balance + money::MONEY_TOLERANCE {
                return Err(OrderError::RefundExceedsBalance {
                    requested: self.amount,
                    balance: item_balance,
                });
            }
        }

        let refund = RefundRecord {
            refund_id: uuid::Uuid::new_v4().to_string(),
            item_id: self.item_id.clone(),
            amount: self.amount,
            reason: self.reason.clone(),
            status: RefundStatus::Pending,
            requested_by: metadata.actor.audit_id(),
            requested_at: chrono::Utc::now().timestamp_millis(),
            decided_at: None,
        };

        let seq = ctx.next_sequence()?;
        let mut events = vec![metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::RefundRequested,
            EventPayload::RefundRequested {
                refund: refund.clone(),
            },
        )];

        // Store-owner refunds skip the approval queue
        if metadata.actor.is_store_owner() || metadata.actor.is_system() {
            let full_refund = money::covers(
                money::add(snapshot.refund_total, self.amount),
                snapshot.total_price,
            );
            let seq = ctx.next_sequence()?;
            events.push(metadata.event(
                seq,
                self.order_id.clone(),
                OrderEventType::RefundApproved,
                EventPayload::RefundApproved {
                    refund_id: refund.refund_id,
                    amount: self.amount,
                    item_id: self.item_id.clone(),
                    full_refund,
                },
            ));
        }

        Ok(events)
    }
}
