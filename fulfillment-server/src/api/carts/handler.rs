//! Cart API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::extract::CommandId;
use crate::api::{command, ok};
use crate::carts::AddItemInput;
use crate::core::ServerState;
use crate::utils::validation::{validate_id, validate_postal_code};
use shared::actor::ActorContext;
use shared::cart::{CartEvent, CartOwner, CartSnapshot};
use shared::order::{OrderCommandPayload, OrderSnapshot};
use shared::{ApiResponse, AppError, AppResult};
use std::collections::HashMap;

/// Resolve the cart owner from the actor context
///
/// Registered callers own account carts; anonymous callers need the stable
/// device token.
fn owner_from_actor(actor: &ActorContext) -> Result<CartOwner, AppError> {
    if let Some(account_id) = &actor.account_id {
        return Ok(CartOwner::Account {
            account_id: account_id.clone(),
        });
    }
    if let Some(device_id) = &actor.device_id {
        return Ok(CartOwner::Device {
            device_id: device_id.clone(),
        });
    }
    Err(AppError::validation(
        "either x-actor-id or x-device-id is required",
    ))
}

/// POST /api/carts/active - get or create the caller's active cart
pub async fn get_or_create(
    State(state): State<ServerState>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    let owner = owner_from_actor(&actor)?;
    let cart = state.carts.get_or_create_active_cart(owner, &actor)?;
    Ok(ok(cart))
}

/// GET /api/carts/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    let cart = state.carts.get_cart(&cart_id, &actor)?;
    Ok(ok(cart))
}

/// GET /api/carts/:id/events - audit trail
pub async fn list_events(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<Vec<CartEvent>>>> {
    validate_id(&cart_id, "cart_id")?;
    let events = state.carts.get_cart_events(&cart_id, &actor)?;
    Ok(ok(events))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1, max = 128))]
    pub listing_id: String,
    #[validate(range(min = 1, max = 9999))]
    pub quantity: i32,
    pub selected_options: Option<HashMap<String, String>>,
    #[serde(default)]
    pub is_gift: bool,
}

/// POST /api/carts/:id/items
pub async fn add_item(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    actor: ActorContext,
    Json(body): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let cart = state
        .carts
        .add_item(
            &cart_id,
            AddItemInput {
                listing_id: body.listing_id,
                quantity: body.quantity,
                selected_options: body.selected_options,
                is_gift: body.is_gift,
            },
            &actor,
        )
        .await?;
    Ok(ok(cart))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// PUT /api/carts/:id/items/:listing_id - quantity 0 removes the line
pub async fn update_item_quantity(
    State(state): State<ServerState>,
    Path((cart_id, listing_id)): Path<(String, String)>,
    actor: ActorContext,
    Json(body): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    validate_id(&listing_id, "listing_id")?;
    if body.quantity < 0 {
        return Err(AppError::validation("quantity must not be negative"));
    }
    let cart = state
        .carts
        .update_item_quantity(&cart_id, &listing_id, body.quantity, &actor)
        .await?;
    Ok(ok(cart))
}

/// DELETE /api/carts/:id/items/:listing_id
pub async fn remove_item(
    State(state): State<ServerState>,
    Path((cart_id, listing_id)): Path<(String, String)>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    validate_id(&listing_id, "listing_id")?;
    let cart = state.carts.remove_item(&cart_id, &listing_id, &actor).await?;
    Ok(ok(cart))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
}

/// POST /api/carts/:id/coupons
pub async fn apply_coupon(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    actor: ActorContext,
    Json(body): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let cart = state.carts.apply_coupon(&cart_id, &body.code, &actor).await?;
    Ok(ok(cart))
}

/// DELETE /api/carts/:id/coupons/:coupon_id
pub async fn remove_coupon(
    State(state): State<ServerState>,
    Path((cart_id, coupon_id)): Path<(String, String)>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    validate_id(&coupon_id, "coupon_id")?;
    let cart = state.carts.remove_coupon(&cart_id, &coupon_id, &actor).await?;
    Ok(ok(cart))
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub destination: String,
}

/// GET /api/carts/:id/shipping-rates?destination=... - quotes and attaches
/// rate options to the cart
pub async fn get_shipping_rates(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    Query(query): Query<RatesQuery>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    validate_postal_code(&query.destination)?;
    let cart = state.carts.get_cart(&cart_id, &actor)?;
    let rates = state.rates.get_rates(&cart, &query.destination).await?;
    let cart = state.carts.attach_rate_options(&cart_id, &rates, &actor)?;
    Ok(ok(cart))
}

#[derive(Debug, Deserialize)]
pub struct SelectShippingRequest {
    pub option_id: String,
}

/// PUT /api/carts/:id/shipping-option
pub async fn select_shipping_option(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    actor: ActorContext,
    Json(body): Json<SelectShippingRequest>,
) -> AppResult<Json<ApiResponse<CartSnapshot>>> {
    validate_id(&cart_id, "cart_id")?;
    validate_id(&body.option_id, "option_id")?;
    let cart = state
        .carts
        .select_shipping_option(&cart_id, &body.option_id, &actor)?;
    Ok(ok(cart))
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: OrderSnapshot,
    /// Present when the payment intent was created; absent when the gateway
    /// failed (retry via POST /api/orders/:id/payment-intent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_error: Option<String>,
}

/// POST /api/carts/:id/checkout - finalize the cart into an order
///
/// Order creation commits atomically. The gateway call happens after the
/// commit and is never retried automatically: on failure the order stays
/// pending/unpaid and the caller retries the intent explicitly.
pub async fn checkout(
    State(state): State<ServerState>,
    Path(cart_id): Path<String>,
    actor: ActorContext,
    CommandId(command_id): CommandId,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    validate_id(&cart_id, "cart_id")?;

    let response = state
        .orders
        .execute_command(command(
            actor.clone(),
            command_id,
            OrderCommandPayload::Checkout {
                cart_id: cart_id.clone(),
            },
        ))
        .await;
    if !response.success {
        let err = response
            .error
            .map(AppError::from)
            .unwrap_or_else(|| AppError::internal("checkout failed without error detail"));
        return Err(err);
    }
    let order = match response.snapshot {
        Some(snapshot) => snapshot,
        // Duplicate checkout command: the cart already converted
        None => {
            return Err(AppError::with_message(
                shared::ErrorCode::CartNotActive,
                "cart already checked out",
            ));
        }
    };

    // Money-moving call, outside any transaction, zero automatic retries
    match state
        .gateway
        .create_payment_intent(order.total_price, &order.currency, &actor.audit_id())
        .await
    {
        Ok(intent) => {
            let attach = state
                .orders
                .execute_command(command(
                    actor,
                    None,
                    OrderCommandPayload::CreatePaymentIntent {
                        order_id: order.order_id.clone(),
                        intent_id: intent.intent_id,
                        amount: order.total_price,
                    },
                ))
                .await;
            let order = attach.snapshot.unwrap_or(order);
            Ok(ok(CheckoutResponse {
                order,
                client_secret: Some(intent.client_secret),
                payment_error: None,
            }))
        }
        Err(e) => {
            tracing::error!(order_id = %order.order_id, error = %e, "Payment intent creation failed");
            Ok(ok(CheckoutResponse {
                order,
                client_secret: None,
                payment_error: Some(e.to_string()),
            }))
        }
    }
}
