//! RecordPayment command handler
//!
//! Driven by the payment gateway callback, never by client choice. On
//! success the reservation of every order item converts into a permanent
//! decrement in this same transaction - if any consumption fails, the
//! payment transition rolls back with it.

use crate::inventory::ledger::commit_consumption_in_txn;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, require_fulfillment_role,
};
use shared::order::{
    EventPayload, OrderEvent, OrderEventType, OrderStatus, PaymentOutcome, PaymentStatus,
};

#[derive(Debug, Clone)]
pub struct RecordPaymentAction {
    pub order_id: String,
    pub intent_id: String,
    pub outcome: PaymentOutcome,
}

impl CommandHandler for RecordPaymentAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // Gateway callbacks arrive as system; operators may replay them
        require_fulfillment_role(&self.order_id, &metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        match snapshot.payment_status {
            PaymentStatus::Unpaid | PaymentStatus::Pending => {}
            PaymentStatus::Paid => return Err(OrderError::AlreadyPaid(self.order_id.clone())),
            other => {
                return Err(OrderError::InvalidTransition(format!(
                    "cannot record payment with payment_status {:?}",
                    other
                )));
            }
        }
        match snapshot.status {
            OrderStatus::Pending | OrderStatus::OnHold => {}
            other => {
                return Err(OrderError::InvalidTransition(format!(
                    "cannot record payment with status {:?}",
                    other
                )));
            }
        }
        if snapshot.payment_intent_id.as_deref() != Some(self.intent_id.as_str()) {
            return Err(OrderError::PaymentIntentMismatch);
        }

        let seq = ctx.next_sequence()?;
        let event = match &self.outcome {
            PaymentOutcome::Succeeded => {
                // Consumption commits atomically with the payment transition
                for item in &snapshot.items {
                    commit_consumption_in_txn(
                        ctx.txn(),
                        &item.listing_id,
                        item.quantity as i64,
                        &snapshot.cart_id,
                        &self.order_id,
                        &metadata.actor,
                    )?;
                }
                metadata.event(
                    seq,
                    self.order_id.clone(),
                    OrderEventType::PaymentReceived,
                    EventPayload::PaymentReceived {
                        intent_id: self.intent_id.clone(),
                        amount: snapshot.total_price,
                    },
                )
            }
            PaymentOutcome::Failed { reason } => metadata.event(
                seq,
                self.order_id.clone(),
                OrderEventType::PaymentFailed,
                EventPayload::PaymentFailed {
                    intent_id: self.intent_id.clone(),
                    reason: reason.clone(),
                },
            ),
        };
        Ok(vec![event])
    }
}
