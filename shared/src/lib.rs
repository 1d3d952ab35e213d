//! Shared types for the KDS (Kitchen Display System) core
//!
//! These types are shared between the KDS server and display clients:
//!
//! - **order** (`order`): display-bound order records and the status state machine
//! - **display** (`display`): kitchen display configuration (externally owned)
//! - **message** (`message`): real-time channel message catalogue and rooms
//! - **aging** (`aging`): pure priority/aging classification and board statistics

pub mod aging;
pub mod display;
pub mod message;
pub mod order;

// Re-export 公共类型
pub use aging::{AgeSeverity, DisplayStats, elapsed_minutes, is_urgent};
pub use display::KitchenDisplay;
pub use message::{ChannelMessage, EventType, RoomId};
pub use order::{DisplayOrder, ItemAddon, OrderItem, OrderStatus, OrderType, PriorityLevel};
