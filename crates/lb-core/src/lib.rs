//! Shared infrastructure for the load balancer workspace.
//!
//! This crate provides the pieces every other crate in the workspace needs:
//! - Replica identity and outcome types
//! - An event system for observability (`BalancerEvent` + `EventListeners`)
//! - `LbError`, the internal error type translated to wire responses at the
//!   axum boundary

mod error;
mod events;
mod outcome;

pub use error::LbError;
pub use events::{BalancerEvent, EventListener, EventListeners, FnListener};
pub use outcome::{Health, Outcome};

/// Identifies a replica by its configured name.
///
/// Names are operator-chosen and unique within a pool; they double as the
/// `/toggle_server` lookup key and the `/stats` label.
pub type ReplicaId = String;
