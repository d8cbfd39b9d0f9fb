//! CancelOrder command handler
//!
//! Cancelling an unpaid order is the compensation path for checkouts that
//! never completed payment: outstanding reservations release in the same
//! transaction. Paid orders keep their consumed stock - restocking is an
//! explicit inventory operation, never a cancellation side effect.

use crate::inventory::ledger::release_in_txn;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, authorize_order,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType};

#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

impl CommandHandler for CancelOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        authorize_order(&snapshot, &metadata.actor)?;

        if !snapshot.status.is_pre_delivered() {
            return Err(OrderError::InvalidTransition(format!(
                "cannot cancel an order with status {:?}",
                snapshot.status
            )));
        }

        let release = !snapshot.is_paid();
        if release {
            for item in &snapshot.items {
                release_in_txn(
                    ctx.txn(),
                    &item.listing_id,
                    item.quantity as i64,
                    &snapshot.cart_id,
                    &metadata.actor,
                )?;
            }
        }

        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                reason: self.reason.clone(),
                released_reservations: release,
            },
        );
        Ok(vec![event])
    }
}
