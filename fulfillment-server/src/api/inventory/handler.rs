//! Inventory API handlers
//!
//! Reads are open to the store owner; stock mutations are store-owner
//! operations and go through the ledger only.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::api::ok;
use crate::core::ServerState;
use crate::inventory::ReconcileReport;
use crate::utils::validation::validate_id;
use shared::actor::ActorContext;
use shared::inventory::{InventoryRecord, InventoryTransaction};
use shared::{ApiResponse, AppError, AppResult};

/// Stock mutations fail as not-found for non-owners, never confirming the
/// listing exists
fn require_store_owner(listing_id: &str, actor: &ActorContext) -> Result<(), AppError> {
    if actor.is_store_owner() || actor.is_system() {
        Ok(())
    } else {
        Err(AppError::not_found(format!("Inventory for {listing_id}")))
    }
}

/// GET /api/inventory/:listing_id
pub async fn get_record(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
) -> AppResult<Json<ApiResponse<InventoryRecord>>> {
    validate_id(&listing_id, "listing_id")?;
    let record = state
        .ledger
        .get(&listing_id)?
        .ok_or_else(|| AppError::not_found(format!("Inventory for {listing_id}")))?;
    Ok(ok(record))
}

/// GET /api/inventory/:listing_id/transactions - the append-only ledger log
pub async fn list_transactions(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<Vec<InventoryTransaction>>>> {
    validate_id(&listing_id, "listing_id")?;
    require_store_owner(&listing_id, &actor)?;
    let entries = state.ledger.transactions(&listing_id)?;
    Ok(ok(entries))
}

#[derive(Debug, Deserialize)]
pub struct AdjustQuantityRequest {
    pub quantity: i64,
}

/// PUT /api/inventory/:listing_id/quantity - set the absolute on-hand stock
pub async fn adjust_quantity(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
    Json(body): Json<AdjustQuantityRequest>,
) -> AppResult<Json<ApiResponse<InventoryRecord>>> {
    validate_id(&listing_id, "listing_id")?;
    require_store_owner(&listing_id, &actor)?;
    let record = state
        .ledger
        .adjust_quantity(&listing_id, body.quantity, &actor)?;
    Ok(ok(record))
}

#[derive(Debug, Deserialize)]
pub struct RestockReturnedRequest {
    pub quantity: i64,
    pub order_id: String,
}

/// POST /api/inventory/:listing_id/restock - explicit restock of returned
/// goods
///
/// Refund approval never restocks by itself; returned stock re-enters
/// inventory only through this operation.
pub async fn restock_returned(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
    Json(body): Json<RestockReturnedRequest>,
) -> AppResult<Json<ApiResponse<InventoryRecord>>> {
    validate_id(&listing_id, "listing_id")?;
    validate_id(&body.order_id, "order_id")?;
    require_store_owner(&listing_id, &actor)?;
    let record = state
        .ledger
        .restock_returned(&listing_id, body.quantity, &body.order_id, &actor)?;
    Ok(ok(record))
}

/// POST /api/inventory/:listing_id/reconcile - replay the log against the
/// record
///
/// A mismatch is ledger corruption: it surfaces as an invariant-violation
/// error carrying the full report, and is never silently repaired.
pub async fn reconcile(
    State(state): State<ServerState>,
    Path(listing_id): Path<String>,
    actor: ActorContext,
) -> AppResult<Json<ApiResponse<ReconcileReport>>> {
    validate_id(&listing_id, "listing_id")?;
    require_store_owner(&listing_id, &actor)?;
    let report = state.ledger.reconcile(&listing_id)?;
    if !report.consistent {
        return Err(AppError::invariant_violation(format!(
            "ledger mismatch for {listing_id}"
        ))
        .with_detail("report", serde_json::to_value(&report).unwrap_or_default()));
    }
    Ok(ok(report))
}
