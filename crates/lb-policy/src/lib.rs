//! Six pluggable replica-selection policies over a point-in-time snapshot of
//! eligible replica state.
//!
//! Each policy is a pure function from `&[ReplicaSnapshot]` to an index into
//! that slice; there is no locking across policy evaluation, and no policy
//! but Round Robin touches the shared cursor.

mod engine;
mod snapshot;

pub use engine::PolicyEngine;
pub use snapshot::ReplicaSnapshot;

/// The six selection algorithms, dispatched from a single tagged variant
/// rather than a stringly-typed identifier plus an if/else chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    RoundRobin,
    LeastConnections,
    WeightedResponseTime,
    PeakEwma,
    PowerOfTwoChoices,
    Adaptive,
}

impl SelectionPolicy {
    /// The wire identifier used by `/config` and `/stats`.
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionPolicy::RoundRobin => "round_robin",
            SelectionPolicy::LeastConnections => "least_connection",
            SelectionPolicy::WeightedResponseTime => "weighted_response_time",
            SelectionPolicy::PeakEwma => "peak_ewma",
            SelectionPolicy::PowerOfTwoChoices => "p2c",
            SelectionPolicy::Adaptive => "adaptive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "round_robin" => Some(SelectionPolicy::RoundRobin),
            "least_connection" => Some(SelectionPolicy::LeastConnections),
            "weighted_response_time" => Some(SelectionPolicy::WeightedResponseTime),
            "peak_ewma" => Some(SelectionPolicy::PeakEwma),
            "p2c" => Some(SelectionPolicy::PowerOfTwoChoices),
            "adaptive" => Some(SelectionPolicy::Adaptive),
            _ => None,
        }
    }
}
