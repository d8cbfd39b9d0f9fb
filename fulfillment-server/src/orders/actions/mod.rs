//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific command type.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{OrderCommand, OrderCommandPayload, OrderEvent};

mod approve_refund;
mod cancel_order;
pub mod checkout;
mod confirm_delivery;
mod create_payment_intent;
mod create_shipment;
mod hold_order;
mod record_payment;
mod request_refund;

pub use approve_refund::ApproveRefundAction;
pub use cancel_order::CancelOrderAction;
pub use checkout::CheckoutAction;
pub use confirm_delivery::ConfirmDeliveryAction;
pub use create_payment_intent::CreatePaymentIntentAction;
pub use create_shipment::CreateShipmentAction;
pub use hold_order::{HoldOrderAction, ResumeOrderAction};
pub use record_payment::RecordPaymentAction;
pub use request_refund::RequestRefundAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    Checkout(CheckoutAction),
    CreatePaymentIntent(CreatePaymentIntentAction),
    RecordPayment(RecordPaymentAction),
    CreateShipment(CreateShipmentAction),
    ConfirmDelivery(ConfirmDeliveryAction),
    CancelOrder(CancelOrderAction),
    HoldOrder(HoldOrderAction),
    ResumeOrder(ResumeOrderAction),
    RequestRefund(RequestRefundAction),
    ApproveRefund(ApproveRefundAction),
}

/// Manual implementation of CommandHandler for CommandAction
impl CommandHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::Checkout(action) => action.execute(ctx, metadata),
            CommandAction::CreatePaymentIntent(action) => action.execute(ctx, metadata),
            CommandAction::RecordPayment(action) => action.execute(ctx, metadata),
            CommandAction::CreateShipment(action) => action.execute(ctx, metadata),
            CommandAction::ConfirmDelivery(action) => action.execute(ctx, metadata),
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata),
            CommandAction::HoldOrder(action) => action.execute(ctx, metadata),
            CommandAction::ResumeOrder(action) => action.execute(ctx, metadata),
            CommandAction::RequestRefund(action) => action.execute(ctx, metadata),
            CommandAction::ApproveRefund(action) => action.execute(ctx, metadata),
        }
    }
}

/// Convert OrderCommand to CommandAction
///
/// This is the ONLY place with a match on OrderCommandPayload.
impl From<&OrderCommand> for CommandAction {
    fn from(cmd: &OrderCommand) -> Self {
        match &cmd.payload {
            OrderCommandPayload::Checkout { .. } => {
                // Checkout is handled specially in OrdersManager to generate
                // the order id and number; this path should never be reached
                unreachable!("Checkout is built by OrdersManager, not From<&OrderCommand>")
            }
            OrderCommandPayload::CreatePaymentIntent {
                order_id,
                intent_id,
                amount,
            } => CommandAction::CreatePaymentIntent(CreatePaymentIntentAction {
                order_id: order_id.clone(),
                intent_id: intent_id.clone(),
                amount: *amount,
            }),
            OrderCommandPayload::RecordPayment {
                order_id,
                intent_id,
                outcome,
            } => CommandAction::RecordPayment(RecordPaymentAction {
                order_id: order_id.clone(),
                intent_id: intent_id.clone(),
                outcome: outcome.clone(),
            }),
            OrderCommandPayload::CreateShipment {
                order_id,
                items,
                carrier,
                service,
                tracking_number,
            } => CommandAction::CreateShipment(CreateShipmentAction {
                order_id: order_id.clone(),
                items: items.clone(),
                carrier: carrier.clone(),
                service: service.clone(),
                tracking_number: tracking_number.clone(),
            }),
            OrderCommandPayload::ConfirmDelivery {
                order_id,
                shipment_id,
            } => CommandAction::ConfirmDelivery(ConfirmDeliveryAction {
                order_id: order_id.clone(),
                shipment_id: shipment_id.clone(),
            }),
            OrderCommandPayload::CancelOrder { order_id, reason } => {
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            OrderCommandPayload::HoldOrder { order_id, reason } => {
                CommandAction::HoldOrder(HoldOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            OrderCommandPayload::ResumeOrder { order_id } => {
                CommandAction::ResumeOrder(ResumeOrderAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::RequestRefund {
                order_id,
                item_id,
                amount,
                reason,
            } => CommandAction::RequestRefund(RequestRefundAction {
                order_id: order_id.clone(),
                item_id: item_id.clone(),
                amount: *amount,
                reason: reason.clone(),
            }),
            OrderCommandPayload::ApproveRefund {
                order_id,
                refund_id,
            } => CommandAction::ApproveRefund(ApproveRefundAction {
                order_id: order_id.clone(),
                refund_id: refund_id.clone(),
            }),
        }
    }
}
