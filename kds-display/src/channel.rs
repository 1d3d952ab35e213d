//! Event channel connection
//!
//! Joins a display room on the KDS server and fans incoming pushes out to
//! local subscribers through a broadcast channel. Losing a push is never
//! fatal; the reconciliation loop heals on its next poll.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use shared::message::{ChannelMessage, EventType, JoinDisplayPayload, StatusUpdatePayload};
use shared::order::OrderStatus;

use crate::error::{ClientError, ClientResult};
use crate::transport::{TcpTransport, Transport};

/// Local fan-out capacity; a lagging subscriber drops pushes, not state
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Handshake wait for `display-connected`
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A joined display-room connection
pub struct ChannelConnection {
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<ChannelMessage>,
    read_task: JoinHandle<()>,
}

impl ChannelConnection {
    /// Connect over TCP and join the display room
    pub async fn connect(
        addr: &str,
        tenant_id: &str,
        display_id: &str,
    ) -> ClientResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(TcpTransport::connect(addr).await?);
        Self::join(transport, tenant_id, display_id).await
    }

    /// Join a display room over an existing transport
    pub async fn join(
        transport: Arc<dyn Transport>,
        tenant_id: &str,
        display_id: &str,
    ) -> ClientResult<Self> {
        transport
            .write_message(&ChannelMessage::join_display(&JoinDisplayPayload {
                display_id: display_id.to_string(),
                tenant_id: tenant_id.to_string(),
            }))
            .await?;

        // Wait for the ack before handing the socket to the read task
        let ack = tokio::time::timeout(JOIN_TIMEOUT, transport.read_message())
            .await
            .map_err(|_| ClientError::Channel("Timed out waiting for display-connected".into()))??;

        match ack.event_type {
            EventType::DisplayConnected => {}
            EventType::Error => {
                let detail = ack
                    .parse_payload::<shared::message::ErrorPayload>()
                    .map(|p| p.message)
                    .unwrap_or_else(|_| "unreadable error payload".to_string());
                return Err(ClientError::Channel(format!("Join rejected: {}", detail)));
            }
            other => {
                return Err(ClientError::Channel(format!(
                    "Unexpected handshake reply: {}",
                    other
                )));
            }
        }

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let read_task = spawn_read_task(transport.clone(), event_tx.clone());

        tracing::info!(tenant_id, display_id, "Joined display room");

        Ok(Self {
            transport,
            event_tx,
            read_task,
        })
    }

    /// Subscribe to pushes from the room
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.event_tx.subscribe()
    }

    /// Fan a status change out to other screens in the room
    ///
    /// Redundant with the server-side broadcast; used when a display wants
    /// to inform siblings faster than their next poll.
    pub async fn emit_status_update(
        &self,
        display_order_id: &str,
        tenant_id: &str,
        new_status: OrderStatus,
    ) -> ClientResult<()> {
        self.transport
            .write_message(&ChannelMessage::update_order_status(&StatusUpdatePayload {
                display_order_id: display_order_id.to_string(),
                tenant_id: tenant_id.to_string(),
                new_status,
            }))
            .await
    }

    /// Whether the read task has exited (transport closed or disconnected)
    pub fn is_closed(&self) -> bool {
        self.read_task.is_finished()
    }

    /// Drop the connection and stop the read task
    pub fn disconnect(&self) {
        self.read_task.abort();
    }
}

impl fmt::Debug for ChannelConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConnection")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Establishes channel connections on behalf of the reconciliation loop
///
/// The loop re-invokes the connector whenever its connection dies, so the
/// join handshake is re-issued on every reconnect.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(&self) -> ClientResult<ChannelConnection>;
}

/// TCP connector for a fixed display room
pub struct TcpChannelConnector {
    addr: String,
    tenant_id: String,
    display_id: String,
}

impl TcpChannelConnector {
    pub fn new(
        addr: impl Into<String>,
        tenant_id: impl Into<String>,
        display_id: impl Into<String>,
    ) -> Self {
        Self {
            addr: addr.into(),
            tenant_id: tenant_id.into(),
            display_id: display_id.into(),
        }
    }

    pub fn from_config(config: &crate::config::DisplayConfig) -> Self {
        Self::new(&config.channel_addr, &config.tenant_id, &config.display_id)
    }
}

#[async_trait]
impl ChannelConnector for TcpChannelConnector {
    async fn connect(&self) -> ClientResult<ChannelConnection> {
        ChannelConnection::connect(&self.addr, &self.tenant_id, &self.display_id).await
    }
}

impl Drop for ChannelConnection {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}

fn spawn_read_task(
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<ChannelMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match transport.read_message().await {
                Ok(msg) => {
                    // No subscribers is fine; pushes are advisory
                    let _ = event_tx.send(msg);
                }
                Err(e) => {
                    tracing::info!(error = %e, "Event channel closed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use shared::message::{DisplayConnectedPayload, StatusChangedPayload};

    #[tokio::test]
    async fn test_join_handshake_and_push_fanout() {
        let (client_end, server_end) = MemoryTransport::pair(16);
        let client_end: Arc<dyn Transport> = Arc::new(client_end);

        let server = tokio::spawn(async move {
            let join = server_end.read_message().await.unwrap();
            assert_eq!(join.event_type, EventType::JoinDisplay);
            let payload: JoinDisplayPayload = join.parse_payload().unwrap();
            assert_eq!(payload.display_id, "disp1");

            server_end
                .write_message(&ChannelMessage::display_connected(
                    &DisplayConnectedPayload {
                        display_id: payload.display_id,
                    },
                ))
                .await
                .unwrap();

            server_end
                .write_message(&ChannelMessage::order_status_updated(
                    &StatusChangedPayload {
                        display_order_id: "d1".to_string(),
                        new_status: OrderStatus::Ready,
                    },
                ))
                .await
                .unwrap();
        });

        let connection = ChannelConnection::join(client_end, "t1", "disp1")
            .await
            .unwrap();
        let mut events = connection.subscribe();

        let pushed = events.recv().await.unwrap();
        assert_eq!(pushed.event_type, EventType::OrderStatusUpdated);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_reports_closed_after_peer_drop() {
        let (client_end, server_end) = MemoryTransport::pair(16);
        let client_end: Arc<dyn Transport> = Arc::new(client_end);

        tokio::spawn(async move {
            let join = server_end.read_message().await.unwrap();
            let payload: JoinDisplayPayload = join.parse_payload().unwrap();
            server_end
                .write_message(&ChannelMessage::display_connected(
                    &DisplayConnectedPayload {
                        display_id: payload.display_id,
                    },
                ))
                .await
                .unwrap();
            // Peer goes away right after the handshake
        });

        let connection = ChannelConnection::join(client_end, "t1", "disp1")
            .await
            .unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !connection.is_closed() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "read task never observed the closed transport"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_join_rejected_by_error_frame() {
        let (client_end, server_end) = MemoryTransport::pair(16);
        let client_end: Arc<dyn Transport> = Arc::new(client_end);

        tokio::spawn(async move {
            let _join = server_end.read_message().await.unwrap();
            server_end
                .write_message(&ChannelMessage::error("room unavailable"))
                .await
                .unwrap();
        });

        let err = ChannelConnection::join(client_end, "t1", "disp1")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Channel(_)));
    }
}
