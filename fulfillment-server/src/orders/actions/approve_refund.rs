//! ApproveRefund command handler

use crate::orders::money;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, require_fulfillment_role,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, RefundStatus};

#[derive(Debug, Clone)]
pub struct ApproveRefundAction {
    pub order_id: String,
    pub refund_id: String,
}

impl CommandHandler for ApproveRefundAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        require_fulfillment_role(&self.order_id, &metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        let refund = snapshot
            .refund(&self.refund_id)
            .ok_or_else(|| OrderError::RefundNotFound(self.refund_id.clone()))?;
        if refund.status != RefundStatus::Pending {
            return Err(OrderError::RefundAlreadyDecided(self.refund_id.clone()));
        }

        // The balance may have shrunk since the request was filed
        let balance = snapshot.refundable_balance();
        if refund.amount > balance + money::MONEY_TOLERANCE {
            return Err(OrderError::RefundExceedsBalance {
                requested: refund.amount,
                balance,
            });
        }

        let full_refund = money::covers(
            money::add(snapshot.refund_total, refund.amount),
            snapshot.total_price,
        );
        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::RefundApproved,
            EventPayload::RefundApproved {
                refund_id: self.refund_id.clone(),
                amount: refund.amount,
                item_id: refund.item_id.clone(),
                full_refund,
            },
        );
        Ok(vec![event])
    }
}
