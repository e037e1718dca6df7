//! Reverse-proxy load balancer library: the request router, control plane,
//! and shared balancer state, exposed as a library so both the `balancer`
//! binary and its integration tests can drive the same `axum::Router`
//! in-process.

pub mod config;
pub mod context;
pub mod control;
pub mod decay;
pub mod router;
pub mod state;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use context::BalancerContext;
use std::sync::Arc;

pub fn app(ctx: Arc<BalancerContext>) -> Router {
    Router::new()
        .route("/", get(router::route))
        .route("/stats", get(control::stats))
        .route("/config", post(control::update_config))
        .route("/toggle_server", post(control::toggle_server))
        .route("/healthz", get(healthz))
        .with_state(ctx)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
