//! Standalone HTTP front-end for one simulated backend replica.
//!
//! Three instances of this binary, each bound to its own port and given a
//! distinct `SIM_NAME`, stand in for the backend pool a balancer instance
//! routes across.

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use lb_simulator::{ReplicaSimulator, SimOutcome, SimulatorProfile};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

#[derive(Clone)]
struct AppState {
    replica: Arc<ReplicaSimulator>,
}

fn config_from_env() -> (String, u16, SimulatorProfile, Option<u64>) {
    let name = std::env::var("SIM_NAME").unwrap_or_else(|_| "server".to_string());
    let port = std::env::var("SIM_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8001);
    let profile = match std::env::var("SIM_PROFILE").as_deref() {
        Ok("phase1") => SimulatorProfile::phase1(),
        _ => SimulatorProfile::phase2(),
    };
    let seed = std::env::var("SIM_SEED").ok().and_then(|v| v.parse().ok());
    (name, port, profile, seed)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let (name, port, profile, seed) = config_from_env();
    let replica = match seed {
        Some(seed) => ReplicaSimulator::with_seed(name.clone(), profile, seed),
        None => ReplicaSimulator::new(name.clone(), profile),
    };
    let state = AppState {
        replica: Arc::new(replica),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.expect("bind error");
    tracing::info!(%name, %addr, "simulated replica listening");

    axum::serve(listener, app(state).into_make_service())
        .await
        .expect("server error");
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_request))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn handle_request(State(state): State<AppState>) -> impl IntoResponse {
    match state.replica.simulate(Instant::now()).await {
        SimOutcome::Served(resp) => Json(resp).into_response(),
        SimOutcome::Crashed(resp) => {
            (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(resp)).into_response()
        }
    }
}

async fn healthz() -> impl IntoResponse {
    axum::http::StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            replica: Arc::new(ReplicaSimulator::with_seed(
                "test",
                SimulatorProfile::phase2(),
                42,
            )),
        }
    }

    #[tokio::test]
    async fn root_returns_200_for_a_cold_replica() {
        let router = app(test_state());
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn root_returns_503_once_sustained_overload_trips_the_breaker() {
        let mut profile = SimulatorProfile::phase2();
        profile.overload_cpu = 0.0;
        profile.overload_streak = 2;
        profile.base_delay = 0.0;
        let state = AppState {
            replica: Arc::new(ReplicaSimulator::with_seed("test", profile, 7)),
        };
        let router = app(state);

        let first = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(first.status(), axum::http::StatusCode::OK);

        let second = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(second.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let router = app(test_state());
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/healthz")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
