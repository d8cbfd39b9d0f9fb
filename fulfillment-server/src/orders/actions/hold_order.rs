//! HoldOrder / ResumeOrder command handlers
//!
//! on_hold pauses the primary axis from pending or processing; resume
//! restores whichever state the hold interrupted.

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, require_fulfillment_role,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

#[derive(Debug, Clone)]
pub struct HoldOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

impl CommandHandler for HoldOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        require_fulfillment_role(&self.order_id, &metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        match snapshot.status {
            OrderStatus::Pending | OrderStatus::Processing => {}
            other => {
                return Err(OrderError::InvalidTransition(format!(
                    "cannot hold an order with status {:?}",
                    other
                )));
            }
        }

        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::OrderHeld,
            EventPayload::OrderHeld {
                reason: self.reason.clone(),
            },
        );
        Ok(vec![event])
    }
}

#[derive(Debug, Clone)]
pub struct ResumeOrderAction {
    pub order_id: String,
}

impl CommandHandler for ResumeOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        require_fulfillment_role(&self.order_id, &metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if snapshot.status != OrderStatus::OnHold {
            return Err(OrderError::InvalidTransition(format!(
                "cannot resume an order with status {:?}",
                snapshot.status
            )));
        }

        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::OrderResumed,
            EventPayload::OrderResumed {},
        );
        Ok(vec![event])
    }
}
