//! Order API handlers
//!
//! State transitions go through the OrdersManager command pipeline; every
//! handler here is a thin translation from HTTP to a command.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::api::extract::CommandId;
use crate::api::{command, command_result, ok};
use crate::core::ServerState;
use crate::utils::validation::{validate_id, validate_optional_text};
use shared::actor::ActorContext;
use shared::order::{
    CommandResponse, OrderCommandPayload, OrderEvent, OrderSnapshot, PaymentOutcome, ShipmentItem,
};
use shared::{ApiResponse, AppError, AppResult};

/// GET /api/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    validate_id(&order_id, "order_id")?;
    let snapshot = state.orders.get_order(&order_id, &actor)?;
    Ok(ok(snapshot))
}

/// GET /api/orders/:id/events - the canonical history
pub async fn list_events(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<Vec<OrderEvent>>>> {
    validate_id(&order_id, "order_id")?;
    let events = state.orders.get_order_events(&order_id, &actor)?;
    Ok(ok(events))
}

#[derive(Debug, serde::Serialize)]
pub struct PaymentIntentResponse {
    pub order: OrderSnapshot,
    pub client_secret: String,
}

/// POST /api/orders/:id/payment-intent - retry path after a gateway failure
pub async fn create_payment_intent(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<PaymentIntentResponse>>> {
    validate_id(&order_id, "order_id")?;
    let order = state.orders.get_order(&order_id, &actor)?;

    // Money-moving call: no automatic retry, failures surface to the caller
    let intent = state
        .gateway
        .create_payment_intent(order.total_price, &order.currency, &actor.audit_id())
        .await?;

    let response = state
        .orders
        .execute_command(command(
            actor,
            None,
            OrderCommandPayload::CreatePaymentIntent {
                order_id: order_id.clone(),
                intent_id: intent.intent_id,
                amount: order.total_price,
            },
        ))
        .await;
    if !response.success {
        let err = response
            .error
            .map(AppError::from)
            .unwrap_or_else(|| AppError::internal("command failed without error detail"));
        return Err(err);
    }
    Ok(ok(PaymentIntentResponse {
        order: response.snapshot.unwrap_or(order),
        client_secret: intent.client_secret,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub intent_id: String,
    /// "succeeded" | "failed"
    pub status: String,
    pub reason: Option<String>,
}

/// POST /api/orders/:id/payments - payment gateway callback
///
/// The gateway is the driver here, not the shopper: the command runs as
/// system regardless of forwarded actor headers.
pub async fn record_payment(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    CommandId(command_id): CommandId,
    Json(body): Json<RecordPaymentRequest>,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    validate_id(&body.intent_id, "intent_id")?;
    let outcome = match body.status.as_str() {
        "succeeded" => PaymentOutcome::Succeeded,
        "failed" => PaymentOutcome::Failed {
            reason: body.reason.unwrap_or_else(|| "payment failed".to_string()),
        },
        other => {
            return Err(AppError::validation(format!(
                "unknown payment status: {other}"
            )));
        }
    };

    let response = state
        .orders
        .execute_command(command(
            ActorContext::system(),
            command_id,
            OrderCommandPayload::RecordPayment {
                order_id,
                intent_id: body.intent_id,
                outcome,
            },
        ))
        .await;
    command_result(response)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    #[validate(length(min = 1))]
    pub items: Vec<ShipmentItemRequest>,
    #[validate(length(min = 1, max = 64))]
    pub carrier: String,
    pub service: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentItemRequest {
    pub item_id: String,
    pub quantity: i32,
}

/// POST /api/orders/:id/shipments
pub async fn create_shipment(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
    Json(body): Json<CreateShipmentRequest>,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let items = body
        .items
        .into_iter()
        .map(|i| ShipmentItem {
            item_id: i.item_id,
            quantity: i.quantity,
        })
        .collect();

    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::CreateShipment {
                order_id,
                items,
                carrier: body.carrier,
                service: body.service,
                tracking_number: body.tracking_number,
            },
        ))
        .await;
    command_result(response)
}

/// POST /api/orders/:id/shipments/:shipment_id/delivered
pub async fn confirm_delivery(
    State(state): State<ServerState>,
    Path((order_id, shipment_id)): Path<(String, String)>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    validate_id(&shipment_id, "shipment_id")?;
    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::ConfirmDelivery {
                order_id,
                shipment_id,
            },
        ))
        .await;
    command_result(response)
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

/// POST /api/orders/:id/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
    body: Option<Json<ReasonRequest>>,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    let reason = body.and_then(|Json(b)| b.reason);
    validate_optional_text(reason.as_deref(), "reason")?;
    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::CancelOrder { order_id, reason },
        ))
        .await;
    command_result(response)
}

/// POST /api/orders/:id/hold
pub async fn hold(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
    body: Option<Json<ReasonRequest>>,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    let reason = body.and_then(|Json(b)| b.reason);
    validate_optional_text(reason.as_deref(), "reason")?;
    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::HoldOrder { order_id, reason },
        ))
        .await;
    command_result(response)
}

/// POST /api/orders/:id/resume
pub async fn resume(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::ResumeOrder { order_id },
        ))
        .await;
    command_result(response)
}

#[derive(Debug, Deserialize, Validate)]
pub struct RequestRefundRequest {
    pub item_id: Option<String>,
    pub amount: f64,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// POST /api/orders/:id/refunds
pub async fn request_refund(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
    Json(body): Json<RequestRefundRequest>,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::RequestRefund {
                order_id,
                item_id: body.item_id,
                amount: body.amount,
                reason: body.reason,
            },
        ))
        .await;
    command_result(response)
}

/// POST /api/orders/:id/refunds/:refund_id/approve
pub async fn approve_refund(
    State(state): State<ServerState>,
    Path((order_id, refund_id)): Path<(String, String)>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    validate_id(&order_id, "order_id")?;
    validate_id(&refund_id, "refund_id")?;
    let response = state
        .orders
        .execute_command(command(
            actor,
            command_id,
            OrderCommandPayload::ApproveRefund {
                order_id,
                refund_id,
            },
        ))
        .await;
    command_result(response)
}
