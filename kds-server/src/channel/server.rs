//! Channel TCP server
//!
//! Accepts display connections and drives the per-connection protocol:
//!
//! 1. A client joins a room with `join-display` (idempotent; a re-join
//!    replaces the previous room subscription) and gets `display-connected`.
//! 2. Room broadcasts (`new-order`, `order-status-updated`,
//!    `display-update`) are forwarded to the socket by a dedicated task.
//! 3. `update-order-status` from a client is re-fanned to the room as
//!    `order-status-updated`. The emitting client has already performed the
//!    authoritative mutation through the transition API; this path only
//!    keeps third-party screens current.
//! 4. Malformed payloads get an `error` frame and the connection stays
//!    open. Only transport-level read failures end the connection.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    ChannelHub, ChannelMessage, DisplayConnectedPayload, EventType, JoinDisplayPayload, RoomId,
    StatusChangedPayload, StatusUpdatePayload, TcpTransport, Transport,
};
use crate::utils::AppError;

/// TCP front-end of the real-time event channel
pub struct ChannelServer {
    listen_addr: String,
    hub: Arc<ChannelHub>,
}

impl ChannelServer {
    pub fn new(listen_addr: impl Into<String>, hub: Arc<ChannelHub>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            hub,
        }
    }

    /// Accept loop; runs until the shutdown token fires
    pub async fn serve(&self, shutdown: CancellationToken) -> Result<(), AppError> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| AppError::Channel(format!("Failed to bind: {}", e)))?;

        tracing::info!("Channel server listening on {}", self.listen_addr);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Channel server shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::info!("Display connected: {}", addr);
                            let transport: Arc<dyn Transport> =
                                Arc::new(TcpTransport::from_stream(stream));
                            let hub = self.hub.clone();
                            let conn_shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                handle_connection(transport, hub, conn_shutdown).await;
                                tracing::info!("Display disconnected: {}", addr);
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Forward room broadcasts to one connection until it drops or lags out
fn spawn_forward_task(
    transport: Arc<dyn Transport>,
    mut rx: broadcast::Receiver<ChannelMessage>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                msg = rx.recv() => match msg {
                    Ok(msg) => {
                        if transport.write_message(&msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // At-most-once: the display heals on its next poll
                        tracing::warn!(skipped, "Display connection lagged behind room broadcasts");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    })
}

/// Per-connection protocol loop
pub(crate) async fn handle_connection(
    transport: Arc<dyn Transport>,
    hub: Arc<ChannelHub>,
    shutdown: CancellationToken,
) {
    let mut joined: Option<RoomId> = None;
    let mut forward_task: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            read = transport.read_message() => {
                let msg = match read {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::info!(error = %e, "Channel connection closed");
                        break;
                    }
                };

                match msg.event_type {
                    EventType::JoinDisplay => match msg.parse_payload::<JoinDisplayPayload>() {
                        Ok(payload) => {
                            let room = RoomId::new(payload.tenant_id, payload.display_id.clone());

                            // Re-join replaces the previous forward task
                            if let Some(task) = forward_task.take() {
                                task.abort();
                            }
                            let rx = hub.join(&room);
                            forward_task = Some(spawn_forward_task(
                                transport.clone(),
                                rx,
                                shutdown.clone(),
                            ));

                            tracing::info!(room = %room, "Display joined room");
                            joined = Some(room);

                            let ack = ChannelMessage::display_connected(&DisplayConnectedPayload {
                                display_id: payload.display_id,
                            });
                            if transport.write_message(&ack).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = transport
                                .write_message(&ChannelMessage::error(format!(
                                    "Malformed join-display payload: {}",
                                    e
                                )))
                                .await;
                        }
                    },

                    EventType::UpdateOrderStatus => {
                        match (&joined, msg.parse_payload::<StatusUpdatePayload>()) {
                            (Some(room), Ok(payload)) => {
                                // Redundant fan-out to third-party screens; the
                                // authoritative mutation already went through the
                                // transition API.
                                let delivered = hub.publish(
                                    room,
                                    ChannelMessage::order_status_updated(&StatusChangedPayload {
                                        display_order_id: payload.display_order_id,
                                        new_status: payload.new_status,
                                    }),
                                );
                                tracing::debug!(room = %room, delivered, "Re-fanned status update");
                            }
                            (None, _) => {
                                let _ = transport
                                    .write_message(&ChannelMessage::error(
                                        "Not joined to a display room",
                                    ))
                                    .await;
                            }
                            (Some(_), Err(e)) => {
                                let _ = transport
                                    .write_message(&ChannelMessage::error(format!(
                                        "Malformed update-order-status payload: {}",
                                        e
                                    )))
                                    .await;
                            }
                        }
                    }

                    other => {
                        let _ = transport
                            .write_message(&ChannelMessage::error(format!(
                                "Unexpected client message: {}",
                                other
                            )))
                            .await;
                    }
                }
            }
        }
    }

    if let Some(task) = forward_task {
        task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryTransport;
    use shared::OrderStatus;

    fn join_msg(tenant: &str, display: &str) -> ChannelMessage {
        ChannelMessage::join_display(&JoinDisplayPayload {
            display_id: display.to_string(),
            tenant_id: tenant.to_string(),
        })
    }

    async fn connect(
        hub: &Arc<ChannelHub>,
        shutdown: &CancellationToken,
    ) -> MemoryTransport {
        let (client, server) = MemoryTransport::pair(64);
        let server: Arc<dyn Transport> = Arc::new(server);
        tokio::spawn(handle_connection(server, hub.clone(), shutdown.clone()));
        client
    }

    #[tokio::test]
    async fn test_join_is_acknowledged() {
        let hub = Arc::new(ChannelHub::new());
        let shutdown = CancellationToken::new();
        let client = connect(&hub, &shutdown).await;

        client.write_message(&join_msg("t1", "disp1")).await.unwrap();

        let ack = client.read_message().await.unwrap();
        assert_eq!(ack.event_type, EventType::DisplayConnected);
        let payload: DisplayConnectedPayload = ack.parse_payload().unwrap();
        assert_eq!(payload.display_id, "disp1");

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_room_broadcast_reaches_joined_connection() {
        let hub = Arc::new(ChannelHub::new());
        let shutdown = CancellationToken::new();
        let client = connect(&hub, &shutdown).await;

        client.write_message(&join_msg("t1", "disp1")).await.unwrap();
        let _ack = client.read_message().await.unwrap();

        let room = RoomId::new("t1", "disp1");
        hub.publish(
            &room,
            ChannelMessage::order_status_updated(&StatusChangedPayload {
                display_order_id: "d1".to_string(),
                new_status: OrderStatus::Preparing,
            }),
        );

        let pushed = client.read_message().await.unwrap();
        assert_eq!(pushed.event_type, EventType::OrderStatusUpdated);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_client_update_is_refanned_to_room() {
        let hub = Arc::new(ChannelHub::new());
        let shutdown = CancellationToken::new();

        let emitter = connect(&hub, &shutdown).await;
        let observer = connect(&hub, &shutdown).await;

        emitter.write_message(&join_msg("t1", "disp1")).await.unwrap();
        let _ = emitter.read_message().await.unwrap();
        observer.write_message(&join_msg("t1", "disp1")).await.unwrap();
        let _ = observer.read_message().await.unwrap();

        emitter
            .write_message(&ChannelMessage::update_order_status(&StatusUpdatePayload {
                display_order_id: "d9".to_string(),
                tenant_id: "t1".to_string(),
                new_status: OrderStatus::Ready,
            }))
            .await
            .unwrap();

        // Both room members receive the authoritative re-broadcast
        let seen = observer.read_message().await.unwrap();
        assert_eq!(seen.event_type, EventType::OrderStatusUpdated);
        let payload: StatusChangedPayload = seen.parse_payload().unwrap();
        assert_eq!(payload.display_order_id, "d9");
        assert_eq!(payload.new_status, OrderStatus::Ready);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_malformed_payload_keeps_connection_open() {
        let hub = Arc::new(ChannelHub::new());
        let shutdown = CancellationToken::new();
        let client = connect(&hub, &shutdown).await;

        client
            .write_message(&ChannelMessage::new(
                EventType::JoinDisplay,
                b"not json".to_vec(),
            ))
            .await
            .unwrap();

        let err = client.read_message().await.unwrap();
        assert_eq!(err.event_type, EventType::Error);

        // Connection survives; a proper join still works
        client.write_message(&join_msg("t1", "disp1")).await.unwrap();
        let ack = client.read_message().await.unwrap();
        assert_eq!(ack.event_type, EventType::DisplayConnected);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_update_before_join_is_rejected() {
        let hub = Arc::new(ChannelHub::new());
        let shutdown = CancellationToken::new();
        let client = connect(&hub, &shutdown).await;

        client
            .write_message(&ChannelMessage::update_order_status(&StatusUpdatePayload {
                display_order_id: "d1".to_string(),
                tenant_id: "t1".to_string(),
                new_status: OrderStatus::Preparing,
            }))
            .await
            .unwrap();

        let err = client.read_message().await.unwrap();
        assert_eq!(err.event_type, EventType::Error);

        shutdown.cancel();
    }
}
