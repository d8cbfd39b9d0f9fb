//! Order API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/events", get(handler::list_events))
        .route("/{id}/payment-intent", post(handler::create_payment_intent))
        .route("/{id}/payments", post(handler::record_payment))
        .route("/{id}/shipments", post(handler::create_shipment))
        .route(
            "/{id}/shipments/{shipment_id}/delivered",
            post(handler::confirm_delivery),
        )
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/hold", post(handler::hold))
        .route("/{id}/resume", post(handler::resume))
        .route("/{id}/refunds", post(handler::request_refund))
        .route(
            "/{id}/refunds/{refund_id}/approve",
            post(handler::approve_refund),
        )
}
