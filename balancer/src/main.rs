//! Binary entry point: reads configuration, builds the shared balancer
//! context, spawns the decay loop, and serves the router.

use balancer::config::BalancerConfig;
use balancer::context::BalancerContext;
use balancer::{app, decay};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = BalancerConfig::from_env();
    let ctx = Arc::new(BalancerContext::new(&config));

    tokio::spawn(decay::run(Arc::clone(&ctx)));

    let addr = config.bind_addr;
    let listener = TcpListener::bind(addr).await.expect("bind error");
    tracing::info!(%addr, "balancer listening");

    axum::serve(listener, app(ctx).into_make_service())
        .await
        .expect("server error");
}
