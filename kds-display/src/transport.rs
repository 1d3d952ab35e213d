//! Client-side transport for the KDS event channel
//!
//! Wire format: 1 byte event type, 4 byte little-endian payload length,
//! JSON payload. Delivery over the channel is at-most-once; the polling
//! reconciliation loop is the source of truth.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::sync::broadcast;

use shared::message::{ChannelMessage, EventType};

use crate::error::{ClientError, ClientResult};

/// Frames larger than this are rejected as corrupt
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn read_message(&self) -> ClientResult<ChannelMessage>;
    async fn write_message(&self, msg: &ChannelMessage) -> ClientResult<()>;
}

async fn read_from_stream<R: AsyncReadExt + Unpin>(reader: &mut R) -> ClientResult<ChannelMessage> {
    // Read event type (1 byte)
    let mut type_buf = [0u8; 1];
    reader
        .read_exact(&mut type_buf)
        .await
        .map_err(|e| ClientError::Channel(format!("Read type failed: {}", e)))?;

    let event_type = EventType::try_from(type_buf[0])
        .map_err(|_| ClientError::Channel("Invalid event type".to_string()))?;

    // Read payload length (4 bytes)
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| ClientError::Channel(format!("Read len failed: {}", e)))?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ClientError::Channel(format!(
            "Frame too large: {} bytes",
            len
        )));
    }

    // Read payload
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| ClientError::Channel(format!("Read payload failed: {}", e)))?;

    Ok(ChannelMessage::new(event_type, payload))
}

async fn write_to_stream<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &ChannelMessage,
) -> ClientResult<()> {
    let mut data = Vec::with_capacity(5 + msg.payload.len());
    data.push(msg.event_type as u8);
    data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&msg.payload);

    writer
        .write_all(&data)
        .await
        .map_err(|e| ClientError::Channel(format!("Write failed: {}", e)))?;
    Ok(())
}

/// TCP transport implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::Channel(format!("TCP connect failed: {}", e)))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> ClientResult<ChannelMessage> {
        let mut reader = self.reader.lock().await;
        read_from_stream(&mut *reader).await
    }

    async fn write_message(&self, msg: &ChannelMessage) -> ClientResult<()> {
        let mut writer = self.writer.lock().await;
        write_to_stream(&mut *writer, msg).await
    }
}

/// In-process memory transport for tests
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
    async fn read_message(&self) -> ClientResult<ChannelMessage> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|e| ClientError::Channel(e.to_string()))
    }

    async fn write_message(&self, msg: &ChannelMessage) -> ClientResult<()> {
        self.tx
            .send(msg.clone())
            .map_err(|e| ClientError::Channel(e.to_string()))?;
        Ok(())
    }
}
