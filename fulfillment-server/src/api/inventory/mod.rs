//! Inventory API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", inventory_routes())
}

fn inventory_routes() -> Router<ServerState> {
    Router::new()
        .route("/{listing_id}", get(handler::get_record))
        .route("/{listing_id}/transactions", get(handler::list_transactions))
        .route("/{listing_id}/quantity", put(handler::adjust_quantity))
        .route("/{listing_id}/restock", post(handler::restock_returned))
        .route("/{listing_id}/reconcile", post(handler::reconcile))
}
