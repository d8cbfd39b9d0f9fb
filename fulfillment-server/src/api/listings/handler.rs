//! Listing API handlers
//!
//! Catalog management for the store owner. The engine treats the catalog
//! as reference data; stock always flows through the inventory ledger.

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::ok;
use crate::core::ServerState;
use crate::db::models::{Listing, ListingCreate, ListingUpdate};
use crate::utils::validation::validate_id;
use shared::actor::ActorContext;
use shared::{ApiResponse, AppError, AppResult};

fn require_store_owner(actor: &ActorContext) -> Result<(), AppError> {
    if actor.is_store_owner() || actor.is_system() {
        Ok(())
    } else {
        Err(AppError::not_found("Listing"))
    }
}

/// GET /api/listings
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<Listing>>>> {
    let listings = state.listing_repo.find_all().await?;
    Ok(ok(listings))
}

/// GET /api/listings/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    validate_id(&listing_id, "listing_id")?;
    let listing = state
        .listing_repo
        .find_by_id(&listing_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Listing {listing_id}")))?;
    Ok(ok(listing))
}

/// POST /api/listings - create a listing and seed its inventory record
pub async fn create(
    State(state): State<ServerState>,
    actor: ActorContext,
    Json(body): Json<ListingCreate>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    require_store_owner(&actor)?;
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if body.initial_quantity < 0 {
        return Err(AppError::validation("initial_quantity must not be negative"));
    }

    let initial_quantity = body.initial_quantity;
    let restock_threshold = body.restock_threshold;
    let listing = state.listing_repo.create(body).await?;

    // Stock enters through the ledger, never by direct writes
    state
        .ledger
        .adjust_quantity(&listing.listing_id, initial_quantity, &actor)?;
    if restock_threshold > 0 {
        state
            .ledger
            .set_restock_threshold(&listing.listing_id, restock_threshold)?;
    }
    Ok(ok(listing))
}

/// PUT /api/listings/:id - apply only the explicitly set fields
pub async fn update(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
    Json(body): Json<ListingUpdate>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    validate_id(&listing_id, "listing_id")?;
    require_store_owner(&actor)?;
    let listing = state.listing_repo.update(&listing_id, body).await?;
    state.catalog.invalidate(&listing_id);
    Ok(ok(listing))
}

/// POST /api/listings/:id/publish
pub async fn publish(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<Listing>>> {
    validate_id(&listing_id, "listing_id")?;
    require_store_owner(&actor)?;
    let update = ListingUpdate {
        published: Some(true),
        ..Default::default()
    };
    let listing = state.listing_repo.update(&listing_id, update).await?;
    state.catalog.invalidate(&listing_id);
    Ok(ok(listing))
}

/// DELETE /api/listings/:id - soft delete, existing carts/orders keep
/// their snapshots
pub async fn delete(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<bool>>> {
    validate_id(&listing_id, "listing_id")?;
    require_store_owner(&actor)?;
    let deleted = state.listing_repo.delete(&listing_id).await?;
    state.catalog.invalidate(&listing_id);
    Ok(ok(deleted))
}
