//! Order snapshot store, external Orders API contract and the status
//! transition engine
//!
//! The KDS core never owns order lifecycle: records are created upstream,
//! fetched as snapshots, mutated only through the transition engine and
//! never deleted here (retention is an external concern).

pub mod api;
pub mod store;
pub mod transition;

pub use api::{HttpOrdersApi, OrdersApi};
pub use store::OrderSnapshotStore;
pub use transition::TransitionEngine;
