//! Room hub - per-display fan-out
//!
//! A room is a `{tenant_id, display_id}` scope. Every connection that joins
//! a room gets its own broadcast receiver; publishing delivers to all
//! current receivers with at-most-once semantics (a lagged or disconnected
//! receiver simply misses the message and self-heals on its next poll).

use dashmap::DashMap;
use shared::message::{ChannelMessage, RoomId};
use tokio::sync::broadcast;

/// Per-room fan-out capacity
const ROOM_CHANNEL_CAPACITY: usize = 256;

/// Room-scoped broadcast hub
#[derive(Debug)]
pub struct ChannelHub {
    rooms: DashMap<RoomId, broadcast::Sender<ChannelMessage>>,
    capacity: usize,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::with_capacity(ROOM_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to a room, creating it lazily
    ///
    /// Idempotent from the caller's perspective: joining the same room again
    /// just hands out a fresh receiver.
    pub fn join(&self, room: &RoomId) -> broadcast::Receiver<ChannelMessage> {
        let sender = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        sender.subscribe()
    }

    /// Publish to a room, returning the number of receivers reached
    ///
    /// A room nobody joined (or with no live receivers) delivers to zero
    /// subscribers; that is not an error.
    pub fn publish(&self, room: &RoomId, msg: ChannelMessage) -> usize {
        match self.rooms.get(room) {
            Some(sender) => sender.send(msg).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of live subscribers in a room
    pub fn subscriber_count(&self, room: &RoomId) -> usize {
        self.rooms
            .get(room)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Rooms that currently have at least one live subscriber
    pub fn active_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().receiver_count() > 0)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventType;

    #[tokio::test]
    async fn test_publish_reaches_room_subscribers_only() {
        let hub = ChannelHub::new();
        let hot = RoomId::new("t1", "hot");
        let cold = RoomId::new("t1", "cold");

        let mut hot_rx = hub.join(&hot);
        let mut cold_rx = hub.join(&cold);

        let delivered = hub.publish(&hot, ChannelMessage::error("hot only"));
        assert_eq!(delivered, 1);

        let msg = hot_rx.recv().await.unwrap();
        assert_eq!(msg.event_type, EventType::Error);
        assert!(cold_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let hub = ChannelHub::new();
        let room = RoomId::new("t1", "disp1");
        assert_eq!(hub.publish(&room, ChannelMessage::error("nobody")), 0);
    }

    #[tokio::test]
    async fn test_rejoin_hands_out_fresh_receiver() {
        let hub = ChannelHub::new();
        let room = RoomId::new("t1", "disp1");

        let _first = hub.join(&room);
        let mut second = hub.join(&room);
        assert_eq!(hub.subscriber_count(&room), 2);

        hub.publish(&room, ChannelMessage::error("hello"));
        assert!(second.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_active_rooms_tracks_live_receivers() {
        let hub = ChannelHub::new();
        let room = RoomId::new("t1", "disp1");
        assert!(hub.active_rooms().is_empty());

        let rx = hub.join(&room);
        assert_eq!(hub.active_rooms(), vec![room.clone()]);

        drop(rx);
        assert!(hub.active_rooms().is_empty());
    }
}
