//! Transport layer abstraction for the real-time event channel
//!
//! Provides a pluggable transport layer:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           ChannelHub                     │
//! │  ┌───────────────────────────────────┐  │
//! │  │  per-room broadcast::Sender       │  │
//! │  └───────────────────────────────────┘  │
//! └────────────────┬────────────────────────┘
//!                  │
//!         ┌────────┴────────┐
//!         │ Transport Trait │
//!         └────────┬────────┘
//!                  │
//!          ┌───────┴───────┐
//!          ▼               ▼
//!    TcpTransport    MemoryTransport
//!    (TCP)           (in-process / tests)
//! ```
//!
//! Delivery over the channel is at-most-once. The channel is a latency
//! optimization; the polling reconciliation loop is the source of truth.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::sync::broadcast;

pub mod hub;
pub mod server;

pub use hub::ChannelHub;
pub use server::ChannelServer;
pub use shared::message::{
    ChannelMessage, DisplayConnectedPayload, DisplayUpdatePayload, ErrorPayload, EventType,
    JoinDisplayPayload, NewOrderPayload, RoomId, StatusChangedPayload, StatusUpdatePayload,
};

use crate::utils::AppError;

/// Frames larger than this are rejected as corrupt
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

// ========== Transport Trait ==========

#[async_trait]
pub trait Transport: Send + Sync {
    async fn read_message(&self) -> Result<ChannelMessage, AppError>;
    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), AppError>;
}

// Helper functions
async fn read_from_stream<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<ChannelMessage, AppError> {
    // Read event type (1 byte)
    let mut type_buf = [0u8; 1];
    reader
        .read_exact(&mut type_buf)
        .await
        .map_err(|e| AppError::Channel(format!("Read type failed: {}", e)))?;

    let event_type = EventType::try_from(type_buf[0])
        .map_err(|_| AppError::Channel("Invalid event type".to_string()))?;

    // Read payload length (4 bytes)
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| AppError::Channel(format!("Read len failed: {}", e)))?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(AppError::Channel(format!("Frame too large: {} bytes", len)));
    }

    // Read payload
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| AppError::Channel(format!("Read payload failed: {}", e)))?;

    Ok(ChannelMessage::new(event_type, payload))
}

async fn write_to_stream<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &ChannelMessage,
) -> Result<(), AppError> {
    let mut data = Vec::with_capacity(5 + msg.payload.len());
    data.push(msg.event_type as u8);
    data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&msg.payload);

    writer
        .write_all(&data)
        .await
        .map_err(|e| AppError::Channel(format!("Write failed: {}", e)))?;
    Ok(())
}

// ========== TCP Transport ==========

/// TCP transport implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, AppError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| AppError::Channel(format!("TCP connect failed: {}", e)))?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<ChannelMessage, AppError> {
        let mut reader = self.reader.lock().await;
        read_from_stream(&mut *reader).await
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), AppError> {
        let mut writer = self.writer.lock().await;
        write_to_stream(&mut *writer, msg).await
    }
}

// ========== Memory Transport (In-Process) ==========

/// In-process memory transport for same-process communication and tests
///
/// A pair of crossed broadcast channels: what one end writes, the other
/// end reads.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    rx: Arc<Mutex<broadcast::Receiver<ChannelMessage>>>,
    tx: broadcast::Sender<ChannelMessage>,
}

impl MemoryTransport {
    /// Create a connected transport pair
    pub fn pair(capacity: usize) -> (MemoryTransport, MemoryTransport) {
        let (a_tx, a_rx) = broadcast::channel(capacity);
        let (b_tx, b_rx) = broadcast::channel(capacity);
        (
            MemoryTransport {
                rx: Arc::new(Mutex::new(b_rx)),
                tx: a_tx,
            },
            MemoryTransport {
                rx: Arc::new(Mutex::new(a_rx)),
                tx: b_tx,
            },
        )
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<ChannelMessage, AppError> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|e| AppError::Channel(e.to_string()))
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), AppError> {
        self.tx
            .send(msg.clone())
            .map_err(|e| AppError::Channel(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport_pair() {
        let (a, b) = MemoryTransport::pair(16);

        let msg = ChannelMessage::error("boom");
        a.write_message(&msg).await.unwrap();

        let received = b.read_message().await.unwrap();
        assert_eq!(received.event_type, EventType::Error);
        let payload: ErrorPayload = received.parse_payload().unwrap();
        assert_eq!(payload.message, "boom");
    }

    #[tokio::test]
    async fn test_memory_transport_is_bidirectional() {
        let (a, b) = MemoryTransport::pair(16);

        b.write_message(&ChannelMessage::display_connected(
            &DisplayConnectedPayload {
                display_id: "disp1".to_string(),
            },
        ))
        .await
        .unwrap();

        let received = a.read_message().await.unwrap();
        assert_eq!(received.event_type, EventType::DisplayConnected);
    }
}
