//! Order Snapshot Store
//!
//! Holds the current set of display-bound orders per room, keyed by
//! display-order id. Contents are supplied externally (Orders API fetch or
//! ingest notification); the store is a cache, never the system of record.

use dashmap::DashMap;
use shared::message::RoomId;
use shared::order::DisplayOrder;
use std::collections::HashMap;

/// Per-room order snapshots
#[derive(Debug, Default)]
pub struct OrderSnapshotStore {
    rooms: DashMap<RoomId, HashMap<String, DisplayOrder>>,
}

impl OrderSnapshotStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Wholesale replace of a room's snapshot (poll refresh)
    pub fn replace_all(&self, room: &RoomId, orders: Vec<DisplayOrder>) {
        let map: HashMap<String, DisplayOrder> =
            orders.into_iter().map(|o| (o.id.clone(), o)).collect();
        self.rooms.insert(room.clone(), map);
    }

    /// Insert or overwrite a single order (ingest, commit, rollback)
    pub fn put(&self, room: &RoomId, order: DisplayOrder) {
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(order.id.clone(), order);
    }

    /// Look up a single order by display-order id
    pub fn get(&self, room: &RoomId, display_order_id: &str) -> Option<DisplayOrder> {
        self.rooms
            .get(room)
            .and_then(|map| map.get(display_order_id).cloned())
    }

    /// Whether the room has ever been populated
    pub fn contains_room(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    /// Stable snapshot of a room's orders, oldest first
    ///
    /// Ties on `created_at` break by id so repeated polls always see the
    /// same board order.
    pub fn orders(&self, room: &RoomId) -> Vec<DisplayOrder> {
        let mut orders: Vec<DisplayOrder> = self
            .rooms
            .get(room)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        orders.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use shared::order::{OrderStatus, OrderType, PriorityLevel};

    fn order(id: &str, minutes_old: i64) -> DisplayOrder {
        DisplayOrder {
            id: id.to_string(),
            order_id: format!("o-{id}"),
            order_number: id.to_uppercase(),
            customer_name: "Test".to_string(),
            order_type: OrderType::Pickup,
            total_amount: Decimal::new(500, 2),
            items: vec![],
            special_instructions: None,
            status: OrderStatus::New,
            priority_level: PriorityLevel::Normal,
            created_at: Utc::now() - Duration::minutes(minutes_old),
            acknowledged_at: None,
            estimated_ready_time: None,
        }
    }

    #[test]
    fn test_replace_all_is_wholesale() {
        let store = OrderSnapshotStore::new();
        let room = RoomId::new("t1", "disp1");

        store.replace_all(&room, vec![order("d1", 5), order("d2", 3)]);
        assert_eq!(store.orders(&room).len(), 2);

        store.replace_all(&room, vec![order("d3", 1)]);
        let orders = store.orders(&room);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "d3");
        assert!(store.get(&room, "d1").is_none());
    }

    #[test]
    fn test_orders_sorted_oldest_first() {
        let store = OrderSnapshotStore::new();
        let room = RoomId::new("t1", "disp1");
        store.replace_all(&room, vec![order("d1", 2), order("d2", 30), order("d3", 10)]);

        let ids: Vec<String> = store.orders(&room).into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["d2", "d3", "d1"]);
    }

    #[test]
    fn test_rooms_are_isolated() {
        let store = OrderSnapshotStore::new();
        let hot = RoomId::new("t1", "hot");
        let cold = RoomId::new("t1", "cold");

        store.put(&hot, order("d1", 1));
        assert!(store.get(&hot, "d1").is_some());
        assert!(store.get(&cold, "d1").is_none());
        assert!(store.orders(&cold).is_empty());
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let store = OrderSnapshotStore::new();
        let room = RoomId::new("t1", "disp1");
        store.put(&room, order("d1", 1));

        let mut updated = order("d1", 1);
        updated.status = OrderStatus::Preparing;
        store.put(&room, updated);

        assert_eq!(
            store.get(&room, "d1").unwrap().status,
            OrderStatus::Preparing
        );
        assert_eq!(store.orders(&room).len(), 1);
    }
}
