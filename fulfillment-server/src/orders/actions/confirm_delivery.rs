//! ConfirmDelivery command handler

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, require_fulfillment_role,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType};

#[derive(Debug, Clone)]
pub struct ConfirmDeliveryAction {
    pub order_id: String,
    pub shipment_id: String,
}

impl CommandHandler for ConfirmDeliveryAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        require_fulfillment_role(&self.order_id, &metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        let shipment = snapshot
            .shipment(&self.shipment_id)
            .ok_or_else(|| OrderError::ShipmentNotFound(self.shipment_id.clone()))?;
        if shipment.is_delivered() {
            return Err(OrderError::InvalidTransition(format!(
                "shipment {} already delivered",
                self.shipment_id
            )));
        }

        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::ShipmentDelivered,
            EventPayload::ShipmentDelivered {
                shipment_id: self.shipment_id.clone(),
            },
        );
        Ok(vec![event])
    }
}
