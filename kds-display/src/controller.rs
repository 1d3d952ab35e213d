//! Display reconciliation controller
//!
//! Owns the local board state and keeps it converged with the server:
//!
//! - a polling loop fetches the full snapshot every refresh interval and
//!   replaces local state wholesale (the source of truth),
//! - channel pushes patch local state between polls for low latency,
//! - any missed or dropped push is healed by the next poll.
//!
//! Status changes go through the HTTP gateway, never through the channel;
//! the channel emit after a successful write only speeds up sibling screens.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio_util::sync::CancellationToken;

use shared::aging::DisplayStats;
use shared::message::{
    ChannelMessage, DisplayUpdatePayload, ErrorPayload, EventType, NewOrderPayload,
    StatusChangedPayload,
};
use shared::order::{DisplayOrder, OrderStatus};

use crate::channel::{ChannelConnection, ChannelConnector};
use crate::config::DisplayConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::OrdersGateway;

/// Audible new-order alert
pub trait SoundAlert: Send + Sync {
    fn play_new_order(&self);
}

/// Silent default for headless and test use
pub struct NoopSoundAlert;

impl SoundAlert for NoopSoundAlert {
    fn play_new_order(&self) {}
}

/// Reconciliation controller for one display
pub struct DisplayController {
    config: DisplayConfig,
    gateway: Arc<dyn OrdersGateway>,
    sound: Arc<dyn SoundAlert>,
    orders: RwLock<Vec<DisplayOrder>>,
    /// Orders with a status write currently on the wire
    in_flight: Mutex<HashSet<String>>,
    cancel: CancellationToken,
}

impl DisplayController {
    pub fn new(
        config: DisplayConfig,
        gateway: Arc<dyn OrdersGateway>,
        sound: Arc<dyn SoundAlert>,
    ) -> Self {
        Self {
            config,
            gateway,
            sound,
            orders: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Current board snapshot, oldest first as served by the server
    pub async fn orders(&self) -> Vec<DisplayOrder> {
        self.orders.read().await.clone()
    }

    /// Board statistics over the current snapshot
    pub async fn stats(&self) -> DisplayStats {
        let orders = self.orders.read().await;
        DisplayStats::compute(&orders, chrono::Utc::now())
    }

    /// Token observed by [`run`]; cancel to stop the loop
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the reconciliation loop
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Drive the reconciliation loop until shutdown
    ///
    /// The connector is invoked whenever the channel is down (at most one
    /// attempt per poll tick), re-issuing the join handshake. Polling never
    /// stops while the channel is down, so the board stays current either way.
    pub async fn run(&self, connector: &dyn ChannelConnector) {
        let mut connection: Option<ChannelConnection> = None;
        // Keeps the parked receiver's sender alive while the channel is down
        let (parked, mut events) = broadcast::channel(1);
        let mut _parked_tx: Option<broadcast::Sender<ChannelMessage>> = Some(parked);
        let mut ticker = tokio::time::interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    if let Some(connection) = &connection {
                        connection.disconnect();
                    }
                    break;
                }

                _ = ticker.tick() => {
                    if connection.as_ref().is_none_or(|c| c.is_closed()) {
                        drop(connection.take());
                        match connector.connect().await {
                            Ok(fresh) => {
                                events = fresh.subscribe();
                                tracing::info!("Event channel connected");
                                connection = Some(fresh);
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Event channel connect failed, next tick retries");
                            }
                        }
                    }
                    if let Err(e) = self.refresh().await {
                        tracing::warn!(error = %e, "Snapshot poll failed, keeping previous board");
                    }
                }

                event = events.recv() => match event {
                    Ok(msg) => self.handle_message(msg).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Dropped pushes are healed by the next poll
                        tracing::warn!(skipped, "Display lagged behind channel pushes");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event channel closed, polling continues until reconnect");
                        // Park the event arm on a channel that never yields;
                        // the next tick attempts a reconnect
                        let (tx, rx) = broadcast::channel(1);
                        _parked_tx = Some(tx);
                        events = rx;
                        drop(connection.take());
                    }
                }
            }
        }
    }

    /// Fetch the full snapshot and replace local state
    ///
    /// On failure the previous board stays visible.
    pub async fn refresh(&self) -> ClientResult<usize> {
        let fetched = self.gateway.fetch_orders().await?;
        let count = fetched.len();
        *self.orders.write().await = fetched;
        Ok(count)
    }

    /// Apply one channel push to local state
    pub async fn handle_message(&self, msg: ChannelMessage) {
        match msg.event_type {
            EventType::NewOrder => match msg.parse_payload::<NewOrderPayload>() {
                Ok(payload) => {
                    // One alert per push event, never per poll refresh
                    if self.config.sound_alerts {
                        self.sound.play_new_order();
                    }
                    // Full re-poll instead of local insertion keeps item and
                    // addon fidelity with the authoritative snapshot
                    if let Err(e) = self.refresh().await {
                        tracing::warn!(
                            display_order_id = %payload.order.id,
                            error = %e,
                            "Re-poll after new-order push failed, next tick retries"
                        );
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Malformed new-order push"),
            },

            EventType::OrderStatusUpdated => {
                match msg.parse_payload::<StatusChangedPayload>() {
                    Ok(payload) => {
                        self.apply_status_change(&payload.display_order_id, payload.new_status)
                            .await
                    }
                    Err(e) => tracing::warn!(error = %e, "Malformed status push"),
                }
            }

            EventType::DisplayUpdate => match msg.parse_payload::<DisplayUpdatePayload>() {
                Ok(payload) => {
                    *self.orders.write().await = payload.orders;
                }
                Err(e) => tracing::warn!(error = %e, "Malformed display-update push"),
            },

            EventType::Error => {
                let detail = msg
                    .parse_payload::<ErrorPayload>()
                    .map(|p| p.message)
                    .unwrap_or_else(|_| "unreadable error payload".to_string());
                tracing::warn!(detail = %detail, "Server reported channel error");
            }

            other => {
                tracing::debug!(event = %other, "Ignoring unexpected push");
            }
        }
    }

    async fn apply_status_change(&self, display_order_id: &str, new_status: OrderStatus) {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|o| o.id == display_order_id) {
            Some(order) => {
                // Any forward move applies, including a jump over a dropped
                // intermediate push; a stale push never regresses the board
                if order.status.precedes(new_status) {
                    order.status = new_status;
                } else if order.status != new_status {
                    tracing::debug!(
                        display_order_id,
                        current = %order.status,
                        pushed = %new_status,
                        "Ignoring out-of-order status push"
                    );
                }
            }
            None => {
                // Unknown order; the next poll will bring it in
                tracing::debug!(display_order_id, "Status push for unknown order");
            }
        }
    }

    /// Request a status transition through the HTTP gateway
    ///
    /// A second request for the same order while one is on the wire is
    /// rejected locally. After a successful write the change is applied
    /// locally and optionally fanned out to sibling screens.
    pub async fn request_transition(
        &self,
        connection: Option<&ChannelConnection>,
        display_order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<DisplayOrder> {
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(display_order_id.to_string()) {
                return Err(ClientError::InvalidTransition(format!(
                    "Transition already in flight for {}",
                    display_order_id
                )));
            }
        }

        let result = self.gateway.update_status(display_order_id, status).await;

        self.in_flight.lock().await.remove(display_order_id);

        let updated = result?;
        self.apply_status_change(display_order_id, updated.status)
            .await;

        if let Some(connection) = connection
            && let Err(e) = connection
                .emit_status_update(display_order_id, &self.config.tenant_id, updated.status)
                .await
        {
            // Siblings catch up on their next poll
            tracing::debug!(error = %e, "Status fan-out failed");
        }

        Ok(updated)
    }
}
