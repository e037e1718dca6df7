use crate::{ReplicaSnapshot, SelectionPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};

const WRT_COLD_SENTINEL: f64 = 9999.0;
const PEAK_EWMA_FLOOR: f64 = 0.1;

/// Holds the one piece of state a policy needs across calls: the round-robin
/// cursor. Every other policy is a pure function of the snapshot it is
/// given.
#[derive(Default)]
pub struct PolicyEngine {
    cursor: AtomicUsize,
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }

    /// Selects an index into `eligible` under `policy`. Returns `None` only
    /// when `eligible` is empty — callers are expected to have already
    /// turned an empty eligible set into a 503 before reaching here.
    pub fn select(&self, policy: SelectionPolicy, eligible: &[ReplicaSnapshot]) -> Option<usize> {
        if eligible.is_empty() {
            return None;
        }
        let chosen = match policy {
            SelectionPolicy::RoundRobin => self.round_robin(eligible),
            SelectionPolicy::LeastConnections => least_connections(eligible),
            SelectionPolicy::WeightedResponseTime => weighted_response_time(eligible),
            SelectionPolicy::PeakEwma => peak_ewma(eligible),
            SelectionPolicy::PowerOfTwoChoices => power_of_two_choices(eligible),
            SelectionPolicy::Adaptive => adaptive(eligible),
        };
        Some(chosen)
    }

    fn round_robin(&self, eligible: &[ReplicaSnapshot]) -> usize {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        i % eligible.len()
    }
}

fn least_connections(eligible: &[ReplicaSnapshot]) -> usize {
    argmin_by(eligible, |r| r.active_conns as f64)
}

fn weighted_response_time(eligible: &[ReplicaSnapshot]) -> usize {
    argmax_by(eligible, |r| {
        if r.avg_latency <= 0.0 {
            WRT_COLD_SENTINEL
        } else {
            r.weight / r.avg_latency
        }
    })
}

fn peak_ewma(eligible: &[ReplicaSnapshot]) -> usize {
    argmin_by(eligible, |r| {
        let ewma = r.peak_ewma_latency.max(PEAK_EWMA_FLOOR);
        (r.active_conns as f64 + 1.0) * ewma
    })
}

fn power_of_two_choices(eligible: &[ReplicaSnapshot]) -> usize {
    if eligible.len() == 1 {
        return 0;
    }
    let mut rng = rand::rng();
    let picks = rand::seq::index::sample(&mut rng, eligible.len(), 2);
    let (a, b) = (picks.index(0), picks.index(1));
    if eligible[a].active_conns <= eligible[b].active_conns {
        a
    } else {
        b
    }
}

fn adaptive(eligible: &[ReplicaSnapshot]) -> usize {
    argmin_by(eligible, |r| {
        0.7 * r.cpu_usage + 0.3 * (5.0 * r.active_conns as f64)
    })
}

/// Argmin/argmax with first-occurrence tie-breaking, matching the "ties
/// broken by first occurrence in the eligible list" rule shared by several
/// policies.
fn argmin_by(eligible: &[ReplicaSnapshot], score: impl Fn(&ReplicaSnapshot) -> f64) -> usize {
    let mut best = 0;
    let mut best_score = score(&eligible[0]);
    for (i, r) in eligible.iter().enumerate().skip(1) {
        let s = score(r);
        if s < best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

fn argmax_by(eligible: &[ReplicaSnapshot], score: impl Fn(&ReplicaSnapshot) -> f64) -> usize {
    let mut best = 0;
    let mut best_score = score(&eligible[0]);
    for (i, r) in eligible.iter().enumerate().skip(1) {
        let s = score(r);
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}
