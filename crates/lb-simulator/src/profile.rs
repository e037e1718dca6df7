use std::time::Duration;

/// The fixed parameters of one simulated replica's CPU/latency model. Two
/// presets are provided (`phase1`/`phase2`); callers are free to hand-tune a
/// third.
#[derive(Debug, Clone, Copy)]
pub struct SimulatorProfile {
    /// Intrinsic service time when idle, in seconds.
    pub base_delay: f64,
    /// CPU saturation curve amplitude.
    pub a: f64,
    /// CPU saturation curve steepness.
    pub k: f64,
    pub idle_noise: (f64, f64),
    pub cpu_jitter: (f64, f64),
    pub p_spike: f64,
    pub p_freeze: f64,
    pub p_jitter: f64,
    pub spike_delay: f64,
    pub freeze_delay: f64,
    pub overload_cpu: f64,
    pub overload_streak: u32,
    pub crash_duration: Duration,
}

impl SimulatorProfile {
    /// The looser of the two presets: wider idle noise band, lower overload
    /// threshold, shorter streak-to-crash. Curve constants take the
    /// per-server heterogeneous `Server_Medium` values as the representative
    /// curve for this preset, the way `idle_noise`/`overload_cpu` already
    /// stand in for a per-phase rather than per-server distinction.
    pub const fn phase1() -> Self {
        Self {
            base_delay: 0.35,
            a: 90.0,
            k: 0.25,
            idle_noise: (2.0, 5.0),
            cpu_jitter: (-3.0, 3.0),
            p_spike: 0.02,
            p_freeze: 0.01,
            p_jitter: 0.05,
            spike_delay: 2.0,
            freeze_delay: 5.0,
            overload_cpu: 95.0,
            overload_streak: 3,
            crash_duration: Duration::from_secs(10),
        }
    }

    /// The tighter, production-leaning preset: homogeneous hardware model.
    pub const fn phase2() -> Self {
        Self {
            base_delay: 0.3,
            a: 90.0,
            k: 0.22,
            idle_noise: (3.0, 6.0),
            cpu_jitter: (-2.0, 2.0),
            p_spike: 0.02,
            p_freeze: 0.01,
            p_jitter: 0.05,
            spike_delay: 2.0,
            freeze_delay: 5.0,
            overload_cpu: 97.0,
            overload_streak: 4,
            crash_duration: Duration::from_secs(8),
        }
    }
}

impl Default for SimulatorProfile {
    fn default() -> Self {
        Self::phase2()
    }
}
