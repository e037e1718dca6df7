use lb_circuitbreaker::{CircuitBreakerSettings, Gate};
use lb_core::{BalancerEvent, EventListeners, Health, Outcome, ReplicaId};
use lb_policy::ReplicaSnapshot;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Moving statistics updated only on a healthy (2xx) outcome.
struct MovingStats {
    avg_latency: f64,
    peak_ewma_latency: f64,
    cpu_usage: f64,
}

/// One backend replica's identity and mutable runtime state.
pub struct Replica {
    pub name: ReplicaId,
    pub url: String,
    pub weight: f64,
    pub price_per_hour: f64,
    enabled: AtomicBool,
    active_conns: AtomicU64,
    total_handled: AtomicU64,
    stats: Mutex<MovingStats>,
    gate: Gate,
}

impl Replica {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        weight: f64,
        price_per_hour: f64,
        avg_latency_seed: f64,
        peak_ewma_seed: f64,
        recovery_window: std::time::Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            weight,
            price_per_hour,
            enabled: AtomicBool::new(true),
            active_conns: AtomicU64::new(0),
            total_handled: AtomicU64::new(0),
            stats: Mutex::new(MovingStats {
                avg_latency: avg_latency_seed,
                peak_ewma_latency: peak_ewma_seed,
                cpu_usage: 0.0,
            }),
            gate: Gate::new(&CircuitBreakerSettings::builder().recovery_window(recovery_window).build()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn is_eligible(&self, now: Instant) -> bool {
        self.gate.is_eligible(self.is_enabled(), now)
    }

    pub fn health(&self) -> Health {
        self.gate.health()
    }

    pub fn active_conns(&self) -> u64 {
        self.active_conns.load(Ordering::Acquire)
    }

    pub fn total_handled(&self) -> u64 {
        self.total_handled.load(Ordering::Acquire)
    }

    pub fn cpu_usage(&self) -> f64 {
        self.stats.lock().expect("stats mutex poisoned").cpu_usage
    }

    pub fn snapshot(&self, index: usize) -> ReplicaSnapshot {
        let stats = self.stats.lock().expect("stats mutex poisoned");
        ReplicaSnapshot {
            index,
            weight: self.weight,
            active_conns: self.active_conns(),
            avg_latency: stats.avg_latency,
            peak_ewma_latency: stats.peak_ewma_latency,
            cpu_usage: stats.cpu_usage,
        }
    }

    /// Increments `active_conns` and returns a guard that decrements it on
    /// drop, including on an unwind — the caller should report the outcome
    /// via [`Replica::record_outcome`] before the guard goes out of scope,
    /// but the decrement itself never depends on that happening.
    pub fn begin_request(&self) -> InFlight<'_> {
        self.active_conns.fetch_add(1, Ordering::SeqCst);
        InFlight { replica: self }
    }

    /// Applies the outcome of a completed forward. Only a `Healthy` outcome
    /// updates the moving statistics; every outcome may transition health via
    /// the gate.
    pub fn record_outcome(&self, outcome: Outcome, latency: f64, ewma_decay: f64, cpu_from_body: Option<f64>, events: &EventListeners) {
        match outcome {
            Outcome::Healthy => {
                {
                    let mut stats = self.stats.lock().expect("stats mutex poisoned");
                    stats.avg_latency = 0.9 * stats.avg_latency + 0.1 * latency;
                    stats.peak_ewma_latency = latency.max((1.0 - ewma_decay) * stats.peak_ewma_latency + ewma_decay * latency);
                    if let Some(cpu) = cpu_from_body {
                        stats.cpu_usage = cpu;
                    }
                }
                self.total_handled.fetch_add(1, Ordering::SeqCst);
                if self.gate.health() == Health::Crashed {
                    self.gate.mark_healthy();
                    events.emit(&BalancerEvent::ReplicaRecovered {
                        replica: self.name.clone(),
                        at: Instant::now(),
                    });
                }
            }
            Outcome::UpstreamCrashed | Outcome::TransportFailure => {
                let was_healthy = self.gate.health() == Health::Healthy;
                self.gate.mark_crashed(Instant::now());
                {
                    let mut stats = self.stats.lock().expect("stats mutex poisoned");
                    stats.cpu_usage = if outcome == Outcome::UpstreamCrashed { 100.0 } else { 0.0 };
                }
                if was_healthy {
                    events.emit(&BalancerEvent::ReplicaCrashed {
                        replica: self.name.clone(),
                        at: Instant::now(),
                    });
                }
            }
            Outcome::UpstreamError => {}
        }
    }

    /// Reduces `cpu_usage` by a decay amount, floored at zero, unless the
    /// replica is currently crashed.
    pub fn decay(&self, amount: f64) {
        if self.health() == Health::Crashed {
            return;
        }
        let mut stats = self.stats.lock().expect("stats mutex poisoned");
        stats.cpu_usage = (stats.cpu_usage - amount).max(0.0);
    }

    /// Manual disable: clears gauges and forces a clean slate so a later
    /// re-enable starts fresh.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        self.active_conns.store(0, Ordering::SeqCst);
        self.gate.reset();
        let mut stats = self.stats.lock().expect("stats mutex poisoned");
        stats.cpu_usage = 0.0;
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }
}

/// RAII guard pairing [`Replica::begin_request`] with the implicit
/// decrement on drop.
pub struct InFlight<'a> {
    replica: &'a Replica,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // Saturating rather than wrapping: a concurrent `disable()` may have
        // already zeroed `active_conns` while this guard was alive.
        let _ = self
            .replica
            .active_conns
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v.saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn replica() -> Replica {
        Replica::new("r1", "http://127.0.0.1:9999", 1.0, 0.0, 0.1, 0.5, Duration::from_secs(10))
    }

    #[test]
    fn begin_request_increments_and_drop_decrements() {
        let r = replica();
        {
            let _guard = r.begin_request();
            assert_eq!(r.active_conns(), 1);
        }
        assert_eq!(r.active_conns(), 0);
    }

    #[test]
    fn healthy_outcome_updates_moving_statistics() {
        let r = replica();
        let events = EventListeners::new();
        let guard = r.begin_request();
        r.record_outcome(Outcome::Healthy, 1.0, 0.3, Some(42.0), &events);
        drop(guard);
        let snap = r.snapshot(0);
        assert!((snap.avg_latency - (0.9 * 0.1 + 0.1 * 1.0)).abs() < 1e-9);
        assert_eq!(snap.cpu_usage, 42.0);
        assert_eq!(r.total_handled(), 1);
    }

    #[test]
    fn peak_ewma_is_peak_biased_on_a_spike() {
        let r = replica();
        let events = EventListeners::new();
        r.record_outcome(Outcome::Healthy, 2.5, 0.3, None, &events);
        // 2.5 is far above the 0.5 seed, so the peak-biased max should pick
        // the raw sample, not the exponentially-smoothed value.
        assert_eq!(r.snapshot(0).peak_ewma_latency, 2.5);
    }

    #[test]
    fn a_crash_outcome_marks_the_replica_ineligible_within_the_window() {
        let r = replica();
        let events = EventListeners::new();
        r.record_outcome(Outcome::UpstreamCrashed, 0.0, 0.3, None, &events);
        assert!(!r.is_eligible(Instant::now()));
    }

    #[test]
    fn disable_clears_gauges_and_forces_healthy() {
        let r = replica();
        let events = EventListeners::new();
        r.record_outcome(Outcome::UpstreamCrashed, 0.0, 0.3, None, &events);
        r.disable();
        assert_eq!(r.active_conns(), 0);
        assert_eq!(r.health(), Health::Healthy);
        assert!(!r.is_eligible(Instant::now()));
    }

    #[test]
    fn a_guard_outliving_a_concurrent_disable_does_not_underflow_active_conns() {
        let r = replica();
        let guard = r.begin_request();
        r.disable();
        assert_eq!(r.active_conns(), 0);
        drop(guard);
        assert_eq!(r.active_conns(), 0);
    }
}
