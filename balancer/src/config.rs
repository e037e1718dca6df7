use std::net::SocketAddr;
use std::time::Duration;

/// Static configuration for one balancer process: bind address, recovery
/// window, EWMA decay, cache probability, and upstream timeout. No
/// environment variable is required for correctness — every value has a
/// spec-accurate default — but an operator may override any of them.
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    pub bind_addr: SocketAddr,
    pub recovery_window: Duration,
    pub ewma_decay: f64,
    pub upstream_timeout: Duration,
    pub cache_probability: f64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            recovery_window: Duration::from_secs(10),
            ewma_decay: 0.3,
            upstream_timeout: Duration::from_secs(30),
            cache_probability: 0.1,
        }
    }
}

impl BalancerConfig {
    /// Builds config from defaults, then applies any of `LB_BIND_ADDR`,
    /// `LB_RECOVERY_WINDOW_SECS`, `LB_UPSTREAM_TIMEOUT_SECS`,
    /// `LB_CACHE_PROBABILITY` found in the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("LB_BIND_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.bind_addr = parsed;
            } else {
                tracing::warn!(%addr, "ignoring unparsable LB_BIND_ADDR");
            }
        }
        if let Some(secs) = env_f64("LB_RECOVERY_WINDOW_SECS") {
            config.recovery_window = Duration::from_secs_f64(secs);
        }
        if let Some(secs) = env_f64("LB_UPSTREAM_TIMEOUT_SECS") {
            config.upstream_timeout = Duration::from_secs_f64(secs);
        }
        if let Some(p) = env_f64("LB_CACHE_PROBABILITY") {
            config.cache_probability = p.clamp(0.0, 1.0);
        }

        config
    }
}

fn env_f64(key: &str) -> Option<f64> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparsable env override");
                None
            }
        },
        Err(_) => None,
    }
}
