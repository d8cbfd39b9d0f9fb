//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health checks
//! - [`carts`] - cart aggregate operations and checkout
//! - [`orders`] - order state machine operations
//! - [`inventory`] - ledger reads, adjustments, reconciliation
//! - [`listings`] - catalog management
//! - [`coupons`] - coupon management
//!
//! Every handler returns the `{ok, data?, error?}` envelope; errors map to
//! status codes through `AppError::http_status`.

pub mod extract;

pub mod carts;
pub mod coupons;
pub mod health;
pub mod inventory;
pub mod listings;
pub mod orders;

use crate::core::ServerState;
use axum::{Json, Router};
use shared::order::{CommandResponse, OrderCommand, OrderCommandPayload};
use shared::{ApiResponse, AppError, AppResult};

/// Assemble the full API router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(carts::router())
        .merge(orders::router())
        .merge(inventory::router())
        .merge(listings::router())
        .merge(coupons::router())
}

/// Wrap data in the success envelope
pub fn ok<T: serde::Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Build an order command, honoring a client-supplied idempotency key
pub fn command(
    actor: shared::actor::ActorContext,
    command_id: Option<String>,
    payload: OrderCommandPayload,
) -> OrderCommand {
    let mut cmd = OrderCommand::new(actor, payload);
    if let Some(id) = command_id {
        cmd.command_id = id;
    }
    cmd
}

/// Translate a command response into an API result
///
/// Failures surface as typed errors with proper status codes; duplicates
/// return success with `duplicate = true` and no snapshot.
pub fn command_result(response: CommandResponse) -> AppResult<Json<ApiResponse<CommandResponse>>> {
    if response.success {
        Ok(ok(response))
    } else {
        let err = response
            .error
            .map(AppError::from)
            .unwrap_or_else(|| AppError::internal("command failed without error detail"));
        Err(err)
    }
}
