//! Order Status API Module
//!
//! The authoritative mutation endpoint for display order status.

mod handler;

use axum::{Router, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/order-status/{id}", put(handler::update_status))
}
