//! CreateShipment command handler

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, require_fulfillment_role,
};
use shared::order::{
    EventPayload, OrderEvent, OrderEventType, OrderStatus, ShipmentItem, ShipmentRecord,
    ShipmentStatus,
};

#[derive(Debug, Clone)]
pub struct CreateShipmentAction {
    pub order_id: String,
    pub items: Vec<ShipmentItem>,
    pub carrier: String,
    pub service: Option<String>,
    pub tracking_number: Option<String>,
}

impl CommandHandler for CreateShipmentAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        require_fulfillment_role(&self.order_id, &metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if !snapshot.is_paid() {
            return Err(OrderError::NotPaid(self.order_id.clone()));
        }
        match snapshot.status {
            OrderStatus::Processing | OrderStatus::Shipped => {}
            other => {
                return Err(OrderError::InvalidTransition(format!(
                    "cannot create a shipment with status {:?}",
                    other
                )));
            }
        }
        if self.items.is_empty() {
            return Err(OrderError::Validation("shipment has no items".into()));
        }
        if self.carrier.trim().is_empty() {
            return Err(OrderError::Validation("carrier must not be empty".into()));
        }

        // Every line must reference an order item and fit its unshipped
        // remainder; digital items never ship
        for line in &self.items {
            if line.quantity <= 0 {
                return Err(OrderError::Validation(format!(
                    "shipment quantity must be positive, got {}",
                    line.quantity
                )));
            }
            let item = snapshot
                .item(&line.item_id)
                .ok_or_else(|| OrderError::Validation(format!("unknown item {}", line.item_id)))?;
            if item.is_digital {
                return Err(OrderError::Validation(format!(
                    "digital item {} cannot be shipped",
                    line.item_id
                )));
            }
            let remaining = item.quantity - snapshot.shipped_quantity(&line.item_id);
            if line.quantity > remaining {
                return Err(OrderError::NothingToShip(format!(
                    "item {} has {} unshipped, shipment wants {}",
                    line.item_id, remaining, line.quantity
                )));
            }
        }

        let shipment = ShipmentRecord {
            shipment_id: uuid::Uuid::new_v4().to_string(),
            items: self.items.clone(),
            carrier: self.carrier.clone(),
            service: self.service.clone(),
            tracking_number: self.tracking_number.clone(),
            status: ShipmentStatus::Pending,
            shipped_at: chrono::Utc::now().timestamp_millis(),
            delivered_at: None,
        };

        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::ShipmentCreated,
            EventPayload::ShipmentCreated { shipment },
        );
        Ok(vec![event])
    }
}
