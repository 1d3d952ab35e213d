//! Typed payloads for the channel message catalogue
//!
//! JSON field names are camelCase to match the external contract consumed
//! by the display frontends.

use crate::order::{DisplayOrder, OrderStatus};
use serde::{Deserialize, Serialize};

/// Room join request (client → server)
///
/// Idempotent: safe to send multiple times on reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDisplayPayload {
    pub display_id: String,
    pub tenant_id: String,
}

/// Room join acknowledgement (server → client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConnectedPayload {
    pub display_id: String,
}

/// New order routed to the display (server → client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderPayload {
    pub order: DisplayOrder,
}

/// Status fan-out request from staff interaction (client → server)
///
/// The emitting client has already called the transition API; this message
/// only asks the server to re-fan the change to third-party screens. It is
/// never the authoritative mutation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatePayload {
    pub display_order_id: String,
    pub tenant_id: String,
    pub new_status: OrderStatus,
}

/// Authoritative status-changed broadcast (server → client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedPayload {
    pub display_order_id: String,
    pub new_status: OrderStatus,
}

/// Full snapshot replace (server → client)
///
/// Sent as a periodic consistency correction, not only on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayUpdatePayload {
    pub orders: Vec<DisplayOrder>,
}

/// Channel-level failure notice (server → client)
///
/// Non-fatal: the connection stays open and polling is unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
}
