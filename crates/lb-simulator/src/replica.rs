use crate::profile::SimulatorProfile;
use crate::response::{CrashedResponse, SimulatedResponse};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What a single simulated request resolves to.
#[derive(Debug, Clone)]
pub enum SimOutcome {
    Served(SimulatedResponse),
    Crashed(CrashedResponse),
}

/// One simulated backend replica: a CPU/latency model plus a self-induced
/// crash/recovery state machine. `name` is echoed back in every response
/// body so a caller forwarding through several of these can tell them apart.
pub struct ReplicaSimulator {
    name: String,
    profile: SimulatorProfile,
    rng: Mutex<StdRng>,
    active_requests: AtomicU64,
    overload_streak: AtomicU64,
    crashed_at: Mutex<Option<Instant>>,
}

impl ReplicaSimulator {
    pub fn new(name: impl Into<String>, profile: SimulatorProfile) -> Self {
        Self {
            name: name.into(),
            profile,
            rng: Mutex::new(StdRng::from_os_rng()),
            active_requests: AtomicU64::new(0),
            overload_streak: AtomicU64::new(0),
            crashed_at: Mutex::new(None),
        }
    }

    /// Same as [`Self::new`] but with a reproducible seed, for deterministic
    /// test runs.
    pub fn with_seed(name: impl Into<String>, profile: SimulatorProfile, seed: u64) -> Self {
        Self {
            name: name.into(),
            profile,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            active_requests: AtomicU64::new(0),
            overload_streak: AtomicU64::new(0),
            crashed_at: Mutex::new(None),
        }
    }

    /// Runs one simulated request to completion, including the modelled
    /// delay. Mirrors the per-request algorithm: crash check, CPU/delay
    /// computation, pathology dispatch, sleep, overload-streak check.
    pub async fn simulate(&self, now: Instant) -> SimOutcome {
        if let Some(crash_start) = *self.crashed_at.lock().expect("crash mutex poisoned") {
            if now.duration_since(crash_start) < self.profile.crash_duration {
                return SimOutcome::Crashed(self.crashed_response("crashed"));
            }
        }
        // Recovery window elapsed (or never crashed): clear any stale crash state.
        *self.crashed_at.lock().expect("crash mutex poisoned") = None;

        let active = self.active_requests.fetch_add(1, Ordering::SeqCst) + 1;
        let (cpu, delay) = self.compute_cpu_and_delay(active);

        tokio::time::sleep(Duration::from_secs_f64(delay.max(0.0))).await;

        let outcome = if cpu > self.profile.overload_cpu {
            let streak = self.overload_streak.fetch_add(1, Ordering::SeqCst) + 1;
            if streak >= self.profile.overload_streak as u64 {
                *self.crashed_at.lock().expect("crash mutex poisoned") = Some(Instant::now());
                self.overload_streak.store(0, Ordering::SeqCst);
                SimOutcome::Crashed(self.crashed_response("crashed_now"))
            } else {
                SimOutcome::Served(self.healthy_response(cpu, delay))
            }
        } else {
            self.overload_streak.store(0, Ordering::SeqCst);
            SimOutcome::Served(self.healthy_response(cpu, delay))
        };

        self.active_requests.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    fn compute_cpu_and_delay(&self, active: u64) -> (f64, f64) {
        let mut rng = self.rng.lock().expect("rng mutex poisoned");
        let (idle_lo, idle_hi) = self.profile.idle_noise;
        let (jit_lo, jit_hi) = self.profile.cpu_jitter;
        let idle_noise: f64 = rng.random_range(idle_lo..=idle_hi);
        let jitter: f64 = rng.random_range(jit_lo..=jit_hi);
        let saturation = self.profile.a * (1.0 - (-self.profile.k * active as f64).exp());
        let cpu = (idle_noise + saturation + jitter).clamp(0.0, 100.0);

        let mut delay = (self.profile.base_delay * (1.0 + cpu / 85.0)
            + rng.random_range(-0.03..=0.03))
        .max(0.01);

        let roll: f64 = rng.random();
        if roll < self.profile.p_spike {
            delay = self.profile.spike_delay;
        } else if roll < self.profile.p_spike + self.profile.p_freeze {
            delay = self.profile.freeze_delay;
        } else if roll < self.profile.p_spike + self.profile.p_freeze + self.profile.p_jitter {
            delay += rng.random_range(0.2..=0.5);
        }

        (cpu, delay)
    }

    fn healthy_response(&self, cpu: f64, delay: f64) -> SimulatedResponse {
        SimulatedResponse {
            server: self.name.clone(),
            status: "handled",
            delay,
            cpu_usage: cpu,
            note: "ok",
        }
    }

    fn crashed_response(&self, status: &'static str) -> CrashedResponse {
        CrashedResponse {
            server: self.name.clone(),
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn active_requests(&self) -> u64 {
        self.active_requests.load(Ordering::SeqCst)
    }
}
