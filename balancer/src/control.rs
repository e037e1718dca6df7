use crate::context::BalancerContext;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use lb_core::BalancerEvent;
use lb_policy::SelectionPolicy;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    algorithm: Option<String>,
    cache_probability: Option<f64>,
}

/// `POST /config` — updates the active policy and/or cache probability.
/// Absent or unrecognized fields are ignored silently; the update is
/// idempotent and partial.
pub async fn update_config(State(ctx): State<Arc<BalancerContext>>, Json(body): Json<ConfigUpdate>) -> impl IntoResponse {
    if let Some(algorithm) = body.algorithm.as_deref() {
        if let Some(policy) = SelectionPolicy::from_str(algorithm) {
            ctx.set_policy(policy);
        }
    }
    if let Some(pct) = body.cache_probability {
        ctx.set_cache_probability(pct / 100.0);
    }
    Json(serde_json::json!({ "status": "updated" }))
}

/// `GET /stats` — a snapshot of process-wide counters and per-replica state.
pub async fn stats(State(ctx): State<Arc<BalancerContext>>) -> impl IntoResponse {
    let servers: Vec<_> = ctx
        .replicas
        .iter()
        .map(|r| {
            serde_json::json!({
                "name": r.name,
                "url": r.url,
                "weight": r.weight,
                "active": r.is_enabled(),
                "health_status": match r.health() {
                    lb_core::Health::Healthy => "healthy",
                    lb_core::Health::Crashed => "crashed",
                },
                "active_conns": r.active_conns(),
                "cpu_usage": r.cpu_usage(),
                "total_handled": r.total_handled(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "algorithm": ctx.policy().as_str(),
        "cache_probability": ctx.cache_probability() * 100.0,
        "total_requests": ctx.total_requests(),
        "cache_hits": ctx.cache_hits(),
        "current_cost_per_hour": ctx.current_cost_per_hour(),
        "servers": servers,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    name: String,
    action: String,
}

/// `POST /toggle_server` — manual enable/disable for one replica by name.
pub async fn toggle_server(State(ctx): State<Arc<BalancerContext>>, Json(body): Json<ToggleRequest>) -> impl IntoResponse {
    let Some(replica) = ctx.find_by_name(&body.name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "status": "not_found" })),
        )
            .into_response();
    };

    match body.action.as_str() {
        "off" => {
            replica.disable();
            ctx.events.emit(&BalancerEvent::ReplicaToggled {
                replica: replica.name.clone(),
                enabled: false,
            });
        }
        "on" => {
            replica.enable();
            ctx.events.emit(&BalancerEvent::ReplicaToggled {
                replica: replica.name.clone(),
                enabled: true,
            });
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "status": "invalid_action" })),
            )
                .into_response();
        }
    }

    Json(serde_json::json!({ "status": "success" })).into_response()
}
