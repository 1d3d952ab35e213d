//! Real-time channel message types
//!
//! These types are shared between the KDS server and display clients, for
//! in-process (memory) and network (TCP) communication. A frame on the wire
//! is `event type (1 byte) + payload length (4 bytes LE) + JSON payload`;
//! the async read/write halves live with the transports on each side.
//!
//! Delivery is at-most-once: there is no acknowledgement and no replay.
//! Consistency is owned by the polling reconciliation loop, never by the
//! channel.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod payload;
pub use payload::*;

/// Channel event types (wire byte values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Client → server: subscribe the connection to a display room
    JoinDisplay = 0,
    /// Server → client: room join acknowledged
    DisplayConnected = 1,
    /// Server → client: a new order was routed to this display
    NewOrder = 2,
    /// Client → server: redundant status fan-out request (the authoritative
    /// mutation has already gone through the transition API)
    UpdateOrderStatus = 3,
    /// Server → client: authoritative broadcast after a transition succeeds
    OrderStatusUpdated = 4,
    /// Server → client: full snapshot replace (periodic consistency correction)
    DisplayUpdate = 5,
    /// Server → client: non-fatal channel-level failure notice
    Error = 6,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(EventType::JoinDisplay),
            1 => Ok(EventType::DisplayConnected),
            2 => Ok(EventType::NewOrder),
            3 => Ok(EventType::UpdateOrderStatus),
            4 => Ok(EventType::OrderStatusUpdated),
            5 => Ok(EventType::DisplayUpdate),
            6 => Ok(EventType::Error),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::JoinDisplay => write!(f, "join-display"),
            EventType::DisplayConnected => write!(f, "display-connected"),
            EventType::NewOrder => write!(f, "new-order"),
            EventType::UpdateOrderStatus => write!(f, "update-order-status"),
            EventType::OrderStatusUpdated => write!(f, "order-status-updated"),
            EventType::DisplayUpdate => write!(f, "display-update"),
            EventType::Error => write!(f, "error"),
        }
    }
}

/// A named subscription scope on the channel: tenant + display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId {
    pub tenant_id: String,
    pub display_id: String,
}

impl RoomId {
    pub fn new(tenant_id: impl Into<String>, display_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            display_id: display_id.into(),
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.display_id)
    }
}

/// A single channel message: event type plus JSON-encoded payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

impl ChannelMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// Build a join-display request
    pub fn join_display(payload: &JoinDisplayPayload) -> Self {
        Self::new(
            EventType::JoinDisplay,
            serde_json::to_vec(payload).expect("Failed to serialize join-display payload"),
        )
    }

    /// Build a room-join acknowledgement
    pub fn display_connected(payload: &DisplayConnectedPayload) -> Self {
        Self::new(
            EventType::DisplayConnected,
            serde_json::to_vec(payload).expect("Failed to serialize display-connected payload"),
        )
    }

    /// Build a new-order push
    pub fn new_order(payload: &NewOrderPayload) -> Self {
        Self::new(
            EventType::NewOrder,
            serde_json::to_vec(payload).expect("Failed to serialize new-order payload"),
        )
    }

    /// Build a client-side status fan-out request
    pub fn update_order_status(payload: &StatusUpdatePayload) -> Self {
        Self::new(
            EventType::UpdateOrderStatus,
            serde_json::to_vec(payload).expect("Failed to serialize update-order-status payload"),
        )
    }

    /// Build an authoritative status-changed broadcast
    pub fn order_status_updated(payload: &StatusChangedPayload) -> Self {
        Self::new(
            EventType::OrderStatusUpdated,
            serde_json::to_vec(payload).expect("Failed to serialize order-status-updated payload"),
        )
    }

    /// Build a full snapshot replace
    pub fn display_update(payload: &DisplayUpdatePayload) -> Self {
        Self::new(
            EventType::DisplayUpdate,
            serde_json::to_vec(payload).expect("Failed to serialize display-update payload"),
        )
    }

    /// Build a non-fatal channel error notice
    pub fn error(message: impl Into<String>) -> Self {
        let payload = ErrorPayload {
            message: message.into(),
        };
        Self::new(
            EventType::Error,
            serde_json::to_vec(&payload).expect("Failed to serialize error payload"),
        )
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;

    #[test]
    fn test_event_type_round_trip() {
        for byte in 0u8..=6 {
            let event = EventType::try_from(byte).unwrap();
            assert_eq!(event as u8, byte);
        }
        assert!(EventType::try_from(7).is_err());
    }

    #[test]
    fn test_status_changed_round_trip() {
        let msg = ChannelMessage::order_status_updated(&StatusChangedPayload {
            display_order_id: "d1".to_string(),
            new_status: OrderStatus::Ready,
        });
        assert_eq!(msg.event_type, EventType::OrderStatusUpdated);

        let parsed: StatusChangedPayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.display_order_id, "d1");
        assert_eq!(parsed.new_status, OrderStatus::Ready);
    }

    #[test]
    fn test_room_id_display() {
        let room = RoomId::new("t1", "disp1");
        assert_eq!(room.to_string(), "t1/disp1");
    }
}
