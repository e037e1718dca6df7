//! Health gate / circuit breaker for a replica pool.
//!
//! Unlike a classic circuit breaker (closed / open / half-open with a
//! permitted-calls probe), the model this crate implements has exactly two
//! states and no active probing: a crashed replica is re-admitted as
//! `Healthy` the instant its recovery window elapses, and the very next
//! forwarded request confirms or re-crashes it. See `Gate::is_eligible`.

mod gate;
mod settings;

pub use gate::Gate;
pub use settings::CircuitBreakerSettings;
