/// Health state of a replica as tracked by the circuit breaker.
///
/// There is no half-open probing state: spec behavior re-admits a crashed
/// replica as healthy the instant the recovery window elapses, and lets the
/// next forwarded request confirm or re-crash it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Crashed,
}

/// The result of forwarding a request to a replica, as observed by the
/// router after the upstream call returns (or fails to).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx from upstream; statistics are updated.
    Healthy,
    /// Upstream returned 503 (self-reported crash).
    UpstreamCrashed,
    /// Upstream returned some other >=400 status; health is unaffected.
    UpstreamError,
    /// Connection refused, reset, or the request timed out.
    TransportFailure,
}
