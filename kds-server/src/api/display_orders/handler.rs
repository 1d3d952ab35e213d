//! Display Orders API Handlers
//!
//! - List the current board snapshot for a display
//! - Ingest a new order pushed from the upstream orders subsystem
//! - Board statistics (status counts, urgency, age)
//! - Force a snapshot refresh from the Orders API

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::aging::DisplayStats;
use shared::message::{ChannelMessage, NewOrderPayload, RoomId};
use shared::order::DisplayOrder;

use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Query params shared by display-scoped reads
#[derive(Debug, Deserialize)]
pub struct DisplayQuery {
    /// Tenant the display belongs to
    pub tenant: String,
}

/// Request body for ingesting a new order
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestOrderRequest {
    #[validate(length(min = 1, message = "tenantId must not be empty"))]
    pub tenant_id: String,
    pub order: DisplayOrder,
}

/// Response body for ingest, reporting push delivery
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOrderResponse {
    pub display_order_id: String,
    /// Connections the new-order event reached; zero is not an error,
    /// polling picks the order up regardless.
    pub delivered: usize,
}

/// GET /api/displays/{id}/orders - Current board snapshot
///
/// Serves from the local snapshot store. An unknown room triggers an
/// on-demand fetch from the Orders API before answering.
pub async fn list_orders(
    State(state): State<ServerState>,
    Path(display_id): Path<String>,
    Query(query): Query<DisplayQuery>,
) -> AppResult<Json<AppResponse<Vec<DisplayOrder>>>> {
    let room = RoomId::new(query.tenant, display_id);

    if !state.store.contains_room(&room) {
        state.refresh_room(&room).await?;
    }

    Ok(ok(state.store.orders(&room)))
}

/// POST /api/displays/{id}/orders - Ingest a new order
///
/// The upstream orders subsystem notifies the KDS of a freshly routed
/// order: store it and push `new-order` to the room.
pub async fn ingest_order(
    State(state): State<ServerState>,
    Path(display_id): Path<String>,
    Json(request): Json<IngestOrderRequest>,
) -> AppResult<Json<AppResponse<IngestOrderResponse>>> {
    request.validate()?;
    if request.order.id.is_empty() {
        return Err(AppError::Validation(
            "order.id must not be empty".to_string(),
        ));
    }

    let room = RoomId::new(request.tenant_id, display_id);
    let display_order_id = request.order.id.clone();

    state.store.put(&room, request.order.clone());
    let delivered = state.hub.publish(
        &room,
        ChannelMessage::new_order(&NewOrderPayload {
            order: request.order,
        }),
    );

    tracing::info!(room = %room, display_order_id = %display_order_id, delivered, "New order ingested");

    Ok(ok(IngestOrderResponse {
        display_order_id,
        delivered,
    }))
}

/// GET /api/displays/{id}/stats - Board statistics
pub async fn stats(
    State(state): State<ServerState>,
    Path(display_id): Path<String>,
    Query(query): Query<DisplayQuery>,
) -> AppResult<Json<AppResponse<DisplayStats>>> {
    let room = RoomId::new(query.tenant, display_id);

    if !state.store.contains_room(&room) {
        state.refresh_room(&room).await?;
    }

    let orders = state.store.orders(&room);
    Ok(ok(DisplayStats::compute(&orders, chrono::Utc::now())))
}

/// POST /api/displays/{id}/refresh - Force a snapshot refresh
pub async fn refresh(
    State(state): State<ServerState>,
    Path(display_id): Path<String>,
    Query(query): Query<DisplayQuery>,
) -> AppResult<Json<AppResponse<usize>>> {
    let room = RoomId::new(query.tenant, display_id);
    let count = state.refresh_room(&room).await?;
    Ok(ok(count))
}
