//! Observability events emitted across the balancer's subsystems.
//!
//! A single event enum (rather than one per crate) keeps the listener
//! registration surface small; callers that only care about circuit-breaker
//! transitions can match and ignore the rest.

use std::fmt;
use std::time::Instant;

/// An event emitted by the health gate, policy engine, or control plane.
#[derive(Debug, Clone)]
pub enum BalancerEvent {
    /// A replica transitioned into the crashed state.
    ReplicaCrashed { replica: String, at: Instant },
    /// A replica was re-admitted as healthy after its recovery window.
    ReplicaRecovered { replica: String, at: Instant },
    /// The active selection policy changed.
    PolicyChanged { from: &'static str, to: &'static str },
    /// A replica was enabled or disabled via the control plane.
    ReplicaToggled { replica: String, enabled: bool },
}

impl BalancerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            BalancerEvent::ReplicaCrashed { .. } => "replica_crashed",
            BalancerEvent::ReplicaRecovered { .. } => "replica_recovered",
            BalancerEvent::PolicyChanged { .. } => "policy_changed",
            BalancerEvent::ReplicaToggled { .. } => "replica_toggled",
        }
    }
}

/// Trait for listening to balancer events.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &BalancerEvent);
}

/// A function-based event listener, for inline registration without a named type.
pub struct FnListener<F>
where
    F: Fn(&BalancerEvent) + Send + Sync,
{
    f: F,
}

impl<F> FnListener<F>
where
    F: Fn(&BalancerEvent) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&BalancerEvent) + Send + Sync,
{
    fn on_event(&self, event: &BalancerEvent) {
        (self.f)(event)
    }
}

/// A collection of event listeners, fanned out to on every emit.
///
/// A panicking listener is caught and logged (when the `tracing` feature is
/// enabled) rather than taking down the request path; one misbehaving
/// listener must not prevent the others from observing the event.
#[derive(Default)]
pub struct EventListeners {
    listeners: Vec<Box<dyn EventListener>>,
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

impl EventListeners {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&self, event: &BalancerEvent) {
        for listener in &self.listeners {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener.on_event(event)));
            if result.is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(event_type = event.event_type(), "event listener panicked");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
