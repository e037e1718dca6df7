use crate::context::BalancerContext;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Background task ticking at least once a second: every enabled, healthy
/// replica's `cpu_usage` decays by a random integer amount in `[10, 20]`,
/// floored at zero. Models idle cool-down between requests.
pub async fn run(ctx: Arc<BalancerContext>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        let mut rng = rand::rng();
        for replica in &ctx.replicas {
            let amount: u32 = rng.random_range(10..=20);
            replica.decay(amount as f64);
        }
    }
}
