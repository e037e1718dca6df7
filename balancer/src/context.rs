use crate::config::BalancerConfig;
use crate::state::Replica;
use lb_cache::ResponseCache;
use lb_core::{BalancerEvent, EventListeners, FnListener};
use lb_policy::{PolicyEngine, SelectionPolicy};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

/// The one shared value passed into every request handler and the
/// background decay task: the replica pool, the selection machinery, the
/// response cache, and the process-wide counters, each with its own small
/// critical section rather than one global lock.
pub struct BalancerContext {
    pub replicas: Vec<Replica>,
    pub policy_engine: PolicyEngine,
    pub cache: ResponseCache,
    pub events: EventListeners,
    pub http: reqwest::Client,
    pub ewma_decay: f64,
    pub upstream_timeout: Duration,
    policy: AtomicU8,
    cache_probability_bits: AtomicU64,
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
}

/// The default listener registered on every context: turns each
/// [`BalancerEvent`] into a structured log line.
fn log_balancer_event(event: &BalancerEvent) {
    match event {
        BalancerEvent::ReplicaCrashed { replica, .. } => {
            tracing::warn!(replica, "replica crashed");
        }
        BalancerEvent::ReplicaRecovered { replica, .. } => {
            tracing::info!(replica, "replica recovered");
        }
        BalancerEvent::PolicyChanged { from, to } => {
            tracing::info!(from, to, "selection policy changed");
        }
        BalancerEvent::ReplicaToggled { replica, enabled } => {
            tracing::info!(replica, enabled, "replica toggled via control plane");
        }
    }
}

fn default_pool(recovery_window: Duration) -> Vec<Replica> {
    vec![
        Replica::new("Fast (8001)", "http://127.0.0.1:8001", 5.0, 10.0, 0.1, 0.1, recovery_window),
        Replica::new("Medium (8002)", "http://127.0.0.1:8002", 3.0, 5.0, 0.5, 0.5, recovery_window),
        Replica::new("Slow (8003)", "http://127.0.0.1:8003", 1.0, 2.0, 1.0, 1.0, recovery_window),
    ]
}

impl BalancerContext {
    pub fn new(config: &BalancerConfig) -> Self {
        Self::with_pool(config, default_pool(config.recovery_window))
    }

    /// Builds a context over a caller-supplied pool, bypassing the default
    /// three-replica pool. Used by integration tests that point replicas at
    /// ephemeral in-process servers.
    pub fn with_pool(config: &BalancerConfig, replicas: Vec<Replica>) -> Self {
        let mut events = EventListeners::new();
        events.add(FnListener::new(log_balancer_event));
        Self {
            replicas,
            policy_engine: PolicyEngine::new(),
            cache: ResponseCache::new(),
            events,
            http: reqwest::Client::builder()
                .timeout(config.upstream_timeout)
                .build()
                .expect("failed to build upstream HTTP client"),
            ewma_decay: config.ewma_decay,
            upstream_timeout: config.upstream_timeout,
            policy: AtomicU8::new(policy_to_tag(SelectionPolicy::PeakEwma)),
            cache_probability_bits: AtomicU64::new(config.cache_probability.to_bits()),
            total_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        tag_to_policy(self.policy.load(Ordering::Acquire))
    }

    pub fn set_policy(&self, new_policy: SelectionPolicy) {
        let previous = self.policy();
        if previous == new_policy {
            return;
        }
        self.policy.store(policy_to_tag(new_policy), Ordering::Release);
        self.events.emit(&BalancerEvent::PolicyChanged {
            from: previous.as_str(),
            to: new_policy.as_str(),
        });
    }

    pub fn cache_probability(&self) -> f64 {
        f64::from_bits(self.cache_probability_bits.load(Ordering::Acquire))
    }

    pub fn set_cache_probability(&self, p: f64) {
        self.cache_probability_bits.store(p.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn current_cost_per_hour(&self) -> f64 {
        self.replicas
            .iter()
            .filter(|r| r.is_enabled())
            .map(|r| r.price_per_hour)
            .sum()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Replica> {
        self.replicas.iter().find(|r| r.name == name)
    }
}

fn policy_to_tag(policy: SelectionPolicy) -> u8 {
    match policy {
        SelectionPolicy::RoundRobin => 0,
        SelectionPolicy::LeastConnections => 1,
        SelectionPolicy::WeightedResponseTime => 2,
        SelectionPolicy::PeakEwma => 3,
        SelectionPolicy::PowerOfTwoChoices => 4,
        SelectionPolicy::Adaptive => 5,
    }
}

fn tag_to_policy(tag: u8) -> SelectionPolicy {
    match tag {
        0 => SelectionPolicy::RoundRobin,
        1 => SelectionPolicy::LeastConnections,
        2 => SelectionPolicy::WeightedResponseTime,
        4 => SelectionPolicy::PowerOfTwoChoices,
        5 => SelectionPolicy::Adaptive,
        _ => SelectionPolicy::PeakEwma,
    }
}
