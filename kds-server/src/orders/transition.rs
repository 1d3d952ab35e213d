//! Status Transition Engine
//!
//! The only mutation path for display orders. Every transition runs:
//!
//! ```text
//! transition(room, display_order_id, requested)
//!     ├─ 1. Look up the current record in the snapshot store
//!     ├─ 2. Validate the requested status is the immediate successor
//!     ├─ 3. Apply optimistically (stamp acknowledged_at on new → preparing)
//!     ├─ 4. Persist through the external Orders API
//!     │      └─ on failure: roll the store back, report the error
//!     └─ 5. Broadcast order-status-updated to the room (best-effort)
//! ```
//!
//! Persistence and broadcast are separate steps, not a transaction. A crash
//! between them leaves state correctly persisted and other screens stale
//! until their next poll - an accepted, self-healing inconsistency window.

use std::sync::Arc;

use shared::message::{ChannelMessage, RoomId, StatusChangedPayload};
use shared::order::{DisplayOrder, OrderStatus};

use super::{OrderSnapshotStore, OrdersApi};
use crate::channel::ChannelHub;
use crate::utils::{AppError, AppResult};

/// Validates, persists and broadcasts order status transitions
pub struct TransitionEngine {
    store: Arc<OrderSnapshotStore>,
    orders_api: Arc<dyn OrdersApi>,
    hub: Arc<ChannelHub>,
}

impl TransitionEngine {
    pub fn new(
        store: Arc<OrderSnapshotStore>,
        orders_api: Arc<dyn OrdersApi>,
        hub: Arc<ChannelHub>,
    ) -> Self {
        Self {
            store,
            orders_api,
            hub,
        }
    }

    /// Apply a status transition and return the updated record
    pub async fn transition(
        &self,
        room: &RoomId,
        display_order_id: &str,
        requested: OrderStatus,
    ) -> AppResult<DisplayOrder> {
        let current = self
            .store
            .get(room, display_order_id)
            .ok_or_else(|| AppError::NotFound(format!("Display order {}", display_order_id)))?;

        // Any skip, repeat or regression is rejected before touching the
        // network and leaves state unchanged.
        if !current.status.can_transition_to(requested) {
            return Err(AppError::InvalidTransition {
                current: current.status,
                requested,
            });
        }

        let prior = current.clone();
        let mut updated = current;
        updated.status = requested;
        if requested == OrderStatus::Preparing && updated.acknowledged_at.is_none() {
            updated.acknowledged_at = Some(chrono::Utc::now());
        }

        // Optimistic local apply, rolled back if the upstream write fails
        self.store.put(room, updated.clone());

        if let Err(e) = self
            .orders_api
            .persist_status(display_order_id, &room.tenant_id, requested)
            .await
        {
            self.store.put(room, prior);
            tracing::warn!(
                display_order_id = %display_order_id,
                requested = %requested,
                error = %e,
                "Status persistence failed, local state rolled back"
            );
            return Err(e);
        }

        // Best-effort: state is already durably persisted, a missed
        // broadcast self-heals within one poll interval.
        let delivered = self.hub.publish(
            room,
            ChannelMessage::order_status_updated(&StatusChangedPayload {
                display_order_id: display_order_id.to_string(),
                new_status: requested,
            }),
        );

        tracing::info!(
            display_order_id = %display_order_id,
            from = %prior.status,
            to = %requested,
            delivered,
            "Order status transitioned"
        );

        Ok(updated)
    }
}
