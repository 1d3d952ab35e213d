//! Display-bound order records and the order status state machine
//!
//! A [`DisplayOrder`] is the per-display projection of an order. One order
//! routed to several kitchen displays (e.g. hot and cold kitchen) produces
//! distinct `DisplayOrder` records sharing `order_id`; the records are never
//! shared mutable state between displays.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status - the sole state machine in the KDS core
///
/// Transitions are monotonic and one-directional:
/// `new → preparing → ready → completed`. No skips, no regressions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    New,
    Preparing,
    Ready,
    Completed,
}

impl OrderStatus {
    /// The only legal next status, `None` for the terminal state
    pub fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::New => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Check whether `requested` is the immediate successor of `self`
    pub fn can_transition_to(self, requested: OrderStatus) -> bool {
        self.successor() == Some(requested)
    }

    /// Whether `other` lies strictly further along the status sequence
    ///
    /// Unlike [`can_transition_to`](Self::can_transition_to) this accepts
    /// multi-step jumps, which a board patching from pushes needs when an
    /// intermediate push was dropped.
    pub fn precedes(self, other: OrderStatus) -> bool {
        let mut cursor = self;
        while let Some(next) = cursor.successor() {
            if next == other {
                return true;
            }
            cursor = next;
        }
        false
    }

    /// Open = still on the board (not completed)
    pub fn is_open(self) -> bool {
        self != OrderStatus::Completed
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "new"),
            OrderStatus::Preparing => write!(f, "preparing"),
            OrderStatus::Ready => write!(f, "ready"),
            OrderStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Explicit priority, set by upstream business logic (never computed here)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityLevel::Low => write!(f, "low"),
            PriorityLevel::Normal => write!(f, "normal"),
            PriorityLevel::High => write!(f, "high"),
            PriorityLevel::Urgent => write!(f, "urgent"),
        }
    }
}

/// How the order reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    Delivery,
    Pickup,
    #[default]
    DineIn,
}

/// An add-on attached to a line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemAddon {
    pub name: String,
    /// Price delta, informational on the kitchen board
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// A single line item on a display order
///
/// Item order is display-relevant (kitchen prep order) and must be
/// preserved exactly as received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub quantity: u32,
    pub name: String,
    #[serde(default)]
    pub addons: Vec<ItemAddon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// The per-display projection of an order - the unit the KDS operates on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOrder {
    /// Display-bound record id (distinct from the underlying order id)
    pub id: String,
    /// Back-reference to the originating order (lookup only, the KDS does
    /// not own the order lifecycle)
    pub order_id: String,
    /// Human-facing order code
    pub order_number: String,
    pub customer_name: String,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub priority_level: PriorityLevel,
    /// Immutable after creation, origin of all age calculations
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when status first transitions into `preparing`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_ready_time: Option<DateTime<Utc>>,
}

impl DisplayOrder {
    /// Check if the order is still open (not completed)
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Age of the order at `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_successor_chain() {
        assert_eq!(OrderStatus::New.successor(), Some(OrderStatus::Preparing));
        assert_eq!(
            OrderStatus::Preparing.successor(),
            Some(OrderStatus::Ready)
        );
        assert_eq!(OrderStatus::Ready.successor(), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::Completed.successor(), None);
    }

    #[test]
    fn test_no_skip_or_regression() {
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Preparing));
        // Skip
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Ready));
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Completed));
        // Regression
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Ready));
        // Repeat
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Preparing));
    }

    #[test]
    fn test_precedes_spans_the_whole_chain() {
        assert!(OrderStatus::New.precedes(OrderStatus::Preparing));
        assert!(OrderStatus::New.precedes(OrderStatus::Completed));
        assert!(OrderStatus::Preparing.precedes(OrderStatus::Completed));
        // Never backwards, never reflexive
        assert!(!OrderStatus::Ready.precedes(OrderStatus::New));
        assert!(!OrderStatus::Ready.precedes(OrderStatus::Ready));
        assert!(!OrderStatus::Completed.precedes(OrderStatus::New));
    }

    #[test]
    fn test_status_serde_values() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Preparing).unwrap(),
            "\"preparing\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(parsed, OrderStatus::Ready);
    }

    #[test]
    fn test_order_type_serde_values() {
        assert_eq!(
            serde_json::to_string(&OrderType::DineIn).unwrap(),
            "\"dine-in\""
        );
        let parsed: OrderType = serde_json::from_str("\"pickup\"").unwrap();
        assert_eq!(parsed, OrderType::Pickup);
    }

    #[test]
    fn test_item_order_preserved_through_serde() {
        let order = DisplayOrder {
            id: "d1".to_string(),
            order_id: "o1".to_string(),
            order_number: "A-042".to_string(),
            customer_name: "Walk-in".to_string(),
            order_type: OrderType::DineIn,
            total_amount: Decimal::new(2450, 2),
            items: vec![
                OrderItem {
                    quantity: 2,
                    name: "Ramen".to_string(),
                    addons: vec![ItemAddon {
                        name: "Extra egg".to_string(),
                        price: Some(Decimal::new(150, 2)),
                    }],
                    special_instructions: Some("No scallions".to_string()),
                },
                OrderItem {
                    quantity: 1,
                    name: "Gyoza".to_string(),
                    addons: vec![],
                    special_instructions: None,
                },
            ],
            special_instructions: None,
            status: OrderStatus::New,
            priority_level: PriorityLevel::Normal,
            created_at: Utc::now(),
            acknowledged_at: None,
            estimated_ready_time: None,
        };

        let json = serde_json::to_string(&order).unwrap();
        let back: DisplayOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.items[0].name, "Ramen");
        assert_eq!(back.items[1].name, "Gyoza");
        assert_eq!(back, order);
    }
}
