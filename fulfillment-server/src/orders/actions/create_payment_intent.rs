//! CreatePaymentIntent command handler
//!
//! Attaches a gateway intent to an order after the gateway call succeeded.
//! The gateway itself is always called outside storage transactions; this
//! command only records the result.

use crate::orders::money;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, authorize_order,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, PaymentStatus};

#[derive(Debug, Clone)]
pub struct CreatePaymentIntentAction {
    pub order_id: String,
    pub intent_id: String,
    pub amount: f64,
}

impl CommandHandler for CreatePaymentIntentAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        authorize_order(&snapshot, &metadata.actor)?;

        match snapshot.payment_status {
            PaymentStatus::Unpaid | PaymentStatus::Pending => {}
            PaymentStatus::Paid => return Err(OrderError::AlreadyPaid(self.order_id.clone())),
            other => {
                return Err(OrderError::InvalidTransition(format!(
                    "cannot create a payment intent with payment_status {:?}",
                    other
                )));
            }
        }
        if !snapshot.status.is_pre_delivered() {
            return Err(OrderError::InvalidTransition(format!(
                "cannot create a payment intent with status {:?}",
                snapshot.status
            )));
        }
        // The intent must cover exactly the frozen order total
        if (self.amount - snapshot.total_price).abs() > money::MONEY_TOLERANCE {
            return Err(OrderError::Validation(format!(
                "intent amount {} does not match order total {}",
                self.amount, snapshot.total_price
            )));
        }

        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::PaymentIntentCreated,
            EventPayload::PaymentIntentCreated {
                intent_id: self.intent_id.clone(),
                amount: self.amount,
            },
        );
        Ok(vec![event])
    }
}
