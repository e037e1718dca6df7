use crate::CircuitBreakerSettings;
use lb_core::Health;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const HEALTHY: u8 = 0;
const CRASHED: u8 = 1;

/// Per-replica health tracking: crash/recovery transitions and eligibility.
///
/// `state` is an atomic so `health()`/`is_eligible` never block a concurrent
/// policy snapshot; `last_crash_time` is written far less often (only on a
/// crash transition) so a small mutex is cheaper than trying to cram an
/// `Instant` into an atomic.
pub struct Gate {
    state: AtomicU8,
    last_crash_time: Mutex<Option<Instant>>,
    recovery_window: Duration,
}

impl Gate {
    pub fn new(settings: &CircuitBreakerSettings) -> Self {
        Self {
            state: AtomicU8::new(HEALTHY),
            last_crash_time: Mutex::new(None),
            recovery_window: settings.recovery_window(),
        }
    }

    pub fn health(&self) -> Health {
        match self.state.load(Ordering::Acquire) {
            CRASHED => Health::Crashed,
            _ => Health::Healthy,
        }
    }

    /// True iff this replica may be selected right now, given the operator's
    /// `enabled` flag. A replica inside its recovery window is skipped even
    /// though `health()` will already read back as `Crashed`; a replica whose
    /// window has elapsed is eligible even before the next request formally
    /// promotes it back to `Healthy` — there is no active health probe.
    pub fn is_eligible(&self, enabled: bool, now: Instant) -> bool {
        if !enabled {
            return false;
        }
        match self.state.load(Ordering::Acquire) {
            CRASHED => {
                let crashed_at = *self.last_crash_time.lock().unwrap();
                match crashed_at {
                    Some(t) => now.duration_since(t) >= self.recovery_window,
                    None => true,
                }
            }
            _ => true,
        }
    }

    /// Marks the replica crashed as of `now`. Called on upstream 503 or
    /// transport failure.
    pub fn mark_crashed(&self, now: Instant) {
        *self.last_crash_time.lock().unwrap() = Some(now);
        self.state.store(CRASHED, Ordering::Release);
        #[cfg(feature = "tracing")]
        tracing::warn!("replica marked crashed");
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("gate_crashes_total").increment(1);
            metrics::gauge!("gate_state").set(1.0);
        }
    }

    /// Marks the replica healthy again. Called on a successful forward
    /// (implicit recovery confirmation) or on manual re-enable.
    pub fn mark_healthy(&self) {
        self.state.store(HEALTHY, Ordering::Release);
        #[cfg(feature = "metrics")]
        metrics::gauge!("gate_state").set(0.0);
    }

    /// Resets to a clean slate, as the manual-disable control-plane action
    /// requires: health forced healthy so a later re-enable starts fresh.
    pub fn reset(&self) {
        *self.last_crash_time.lock().unwrap() = None;
        self.state.store(HEALTHY, Ordering::Release);
        #[cfg(feature = "metrics")]
        metrics::gauge!("gate_state").set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(window: Duration) -> Gate {
        Gate::new(&CircuitBreakerSettings::builder().recovery_window(window).build())
    }

    #[test]
    fn healthy_replica_is_eligible_when_enabled() {
        let g = gate(Duration::from_secs(10));
        assert!(g.is_eligible(true, Instant::now()));
    }

    #[test]
    fn disabled_replica_is_never_eligible() {
        let g = gate(Duration::from_secs(10));
        assert!(!g.is_eligible(false, Instant::now()));
    }

    #[test]
    fn crashed_replica_excluded_within_recovery_window() {
        let g = gate(Duration::from_secs(10));
        let crash_time = Instant::now();
        g.mark_crashed(crash_time);
        assert_eq!(g.health(), Health::Crashed);
        assert!(!g.is_eligible(true, crash_time + Duration::from_secs(5)));
    }

    #[test]
    fn crashed_replica_eligible_after_recovery_window_elapses() {
        let g = gate(Duration::from_millis(50));
        let crash_time = Instant::now();
        g.mark_crashed(crash_time);
        assert!(g.is_eligible(true, crash_time + Duration::from_millis(51)));
    }

    #[test]
    fn reset_clears_crash_state() {
        let g = gate(Duration::from_secs(10));
        g.mark_crashed(Instant::now());
        g.reset();
        assert_eq!(g.health(), Health::Healthy);
        assert!(g.is_eligible(true, Instant::now()));
    }
}
