//! Cart API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/carts", cart_routes())
}

fn cart_routes() -> Router<ServerState> {
    Router::new()
        .route("/active", post(handler::get_or_create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/events", get(handler::list_events))
        .route("/{id}/items", post(handler::add_item))
        .route(
            "/{id}/items/{listing_id}",
            put(handler::update_item_quantity).delete(handler::remove_item),
        )
        .route("/{id}/coupons", post(handler::apply_coupon))
        .route("/{id}/coupons/{coupon_id}", axum::routing::delete(handler::remove_coupon))
        .route("/{id}/shipping-rates", get(handler::get_shipping_rates))
        .route("/{id}/shipping-option", put(handler::select_shipping_option))
        .route("/{id}/checkout", post(handler::checkout))
}
