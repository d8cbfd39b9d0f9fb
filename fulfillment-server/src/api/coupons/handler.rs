//! Coupon API handlers (store-owner management)

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::ok;
use crate::core::ServerState;
use crate::db::models::{Coupon, CouponCreate};
use crate::utils::validation::validate_id;
use shared::actor::ActorContext;
use shared::{ApiResponse, AppError, AppResult};

fn require_store_owner(actor: &ActorContext) -> Result<(), AppError> {
    if actor.is_store_owner() || actor.is_system() {
        Ok(())
    } else {
        Err(AppError::not_found("Coupon"))
    }
}

/// GET /api/coupons
pub async fn list(
    State(state): State<ServerState>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<Vec<Coupon>>>> {
    require_store_owner(&actor)?;
    let coupons = state.coupon_repo.find_all().await?;
    Ok(ok(coupons))
}

/// GET /api/coupons/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(coupon_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    validate_id(&coupon_id, "coupon_id")?;
    require_store_owner(&actor)?;
    let coupon = state
        .coupon_repo
        .find_by_id(&coupon_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Coupon {coupon_id}")))?;
    Ok(ok(coupon))
}

/// POST /api/coupons
pub async fn create(
    State(state): State<ServerState>,
    actor: ActorContext,
    Json(body): Json<CouponCreate>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    require_store_owner(&actor)?;
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let coupon = state.coupon_repo.create(body).await?;
    Ok(ok(coupon))
}

/// DELETE /api/coupons/:id
///
/// Carts that already froze this coupon's terms keep them.
pub async fn delete(
    State(state): State<ServerState>,
    Path(coupon_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<bool>>> {
    validate_id(&coupon_id, "coupon_id")?;
    require_store_owner(&actor)?;
    let deleted = state.coupon_repo.delete(&coupon_id).await?;
    Ok(ok(deleted))
}
