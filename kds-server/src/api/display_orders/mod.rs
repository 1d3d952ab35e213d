//! Display Orders API Module
//!
//! REST surface for the per-display order board: snapshot reads, new-order
//! ingest and board statistics.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/displays", display_routes())
}

fn display_routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/{id}/orders",
            get(handler::list_orders).post(handler::ingest_order),
        )
        .route("/{id}/stats", get(handler::stats))
        .route("/{id}/refresh", post(handler::refresh))
}
