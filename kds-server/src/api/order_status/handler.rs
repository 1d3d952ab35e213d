//! Order Status API Handlers
//!
//! Every status write goes through the transition engine: strict successor
//! validation, optimistic apply with rollback, upstream persistence and a
//! best-effort room broadcast.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::message::RoomId;
use shared::order::{DisplayOrder, OrderStatus};

use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

/// Request body for a status transition
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[validate(length(min = 1, message = "tenantId must not be empty"))]
    pub tenant_id: String,
    #[validate(length(min = 1, message = "displayId must not be empty"))]
    pub display_id: String,
}

/// PUT /api/order-status/{id} - Apply a status transition
///
/// Returns 409 for any skip, repeat or regression; 502 when the upstream
/// write fails (local state rolled back, retry is safe).
pub async fn update_status(
    State(state): State<ServerState>,
    Path(display_order_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<DisplayOrder>>> {
    request.validate()?;

    let room = RoomId::new(request.tenant_id, request.display_id);
    let requested: OrderStatus = request.status;

    let updated = state
        .transition_engine()
        .transition(&room, &display_order_id, requested)
        .await?;

    Ok(ok(updated))
}
