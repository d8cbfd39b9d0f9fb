//! Shipment event appliers

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus, ShipmentStatus};

/// ShipmentCreated applier - records the shipment, order moves to shipped
pub struct ShipmentCreatedApplier;

impl EventApplier for ShipmentCreatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ShipmentCreated { shipment } = &event.payload {
            snapshot.shipments.push(shipment.clone());
            if snapshot.status == OrderStatus::Processing {
                snapshot.status = OrderStatus::Shipped;
            }
            snapshot.fulfillment_status = snapshot.computed_fulfillment();
            finish(snapshot, event);
        }
    }
}

/// ShipmentDelivered applier - order delivers once every shipment has
pub struct ShipmentDeliveredApplier;

impl EventApplier for ShipmentDeliveredApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ShipmentDelivered { shipment_id } = &event.payload {
            if let Some(shipment) = snapshot
                .shipments
                .iter_mut()
                .find(|s| &s.shipment_id == shipment_id)
            {
                shipment.status = ShipmentStatus::Delivered;
                shipment.delivered_at = Some(event.timestamp);
            }
            if snapshot.all_shipments_delivered()
                && snapshot.fulfillment_status == shared::order::FulfillmentStatus::Fulfilled
                && snapshot.status == OrderStatus::Shipped
            {
                snapshot.status = OrderStatus::Delivered;
            }
            finish(snapshot, event);
        }
    }
}
