use crate::context::BalancerContext;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use lb_core::{LbError, Outcome};
use lb_policy::ReplicaSnapshot;
use std::sync::Arc;
use std::time::Instant;

/// `GET /` — orchestrates the cache probe, policy selection, forward, and
/// statistics update for one inbound request.
pub async fn route(State(ctx): State<Arc<BalancerContext>>, RawQuery(query): RawQuery) -> impl IntoResponse {
    ctx.record_request();

    if let Some(cached) = ctx.cache.probe(ctx.cache_probability()) {
        ctx.record_cache_hit();
        return (StatusCode::OK, served_from_cache(cached.body)).into_response();
    }

    let now = Instant::now();
    let eligible: Vec<(usize, ReplicaSnapshot)> = ctx
        .replicas
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_eligible(now))
        .enumerate()
        .map(|(local_idx, (pool_idx, r))| (pool_idx, r.snapshot(local_idx)))
        .collect();

    if eligible.is_empty() {
        return lb_error_response(&LbError::NoEligibleReplica).into_response();
    }

    let snapshots: Vec<ReplicaSnapshot> = eligible.iter().map(|(_, s)| *s).collect();
    let local_choice = ctx
        .policy_engine
        .select(ctx.policy(), &snapshots)
        .expect("eligible set is non-empty");
    let pool_idx = eligible[local_choice].0;
    let replica = &ctx.replicas[pool_idx];

    let url = match &query {
        Some(q) if !q.is_empty() => format!("{}?{}", replica.url, q),
        _ => replica.url.clone(),
    };

    let guard = replica.begin_request();
    let started = Instant::now();
    let send_result = ctx.http.get(&url).send().await;
    let latency = started.elapsed().as_secs_f64();

    let response = match send_result {
        Ok(resp) => {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or_default();
            if status.is_success() {
                let cpu = extract_cpu_usage(&body);
                ctx.cache.store(body.to_vec());
                replica.record_outcome(Outcome::Healthy, latency, ctx.ewma_decay, cpu, &ctx.events);
                (status, body).into_response()
            } else if status == StatusCode::SERVICE_UNAVAILABLE {
                replica.record_outcome(Outcome::UpstreamCrashed, latency, ctx.ewma_decay, None, &ctx.events);
                log_upstream_status(&replica.name, status);
                (status, body).into_response()
            } else {
                replica.record_outcome(Outcome::UpstreamError, latency, ctx.ewma_decay, None, &ctx.events);
                log_upstream_status(&replica.name, status);
                (status, body).into_response()
            }
        }
        Err(_) => {
            replica.record_outcome(Outcome::TransportFailure, latency, ctx.ewma_decay, None, &ctx.events);
            lb_error_response(&LbError::UpstreamTransport {
                replica: replica.name.clone(),
            })
            .into_response()
        }
    };
    drop(guard);
    response
}

/// Non-2xx, non-503 upstream responses are passed through verbatim; this
/// only records the typed failure for observability.
fn log_upstream_status(replica: &str, status: StatusCode) {
    let err = LbError::UpstreamStatus {
        replica: replica.to_string(),
        status: status.as_u16(),
    };
    tracing::debug!(%err, "upstream returned a non-2xx, non-503 status");
}

/// Maps an `LbError` that has no upstream body of its own to its wire
/// status/body.
fn lb_error_response(err: &LbError) -> (StatusCode, Json<serde_json::Value>) {
    match err {
        LbError::NoEligibleReplica => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "system_failure", "error": err.to_string() })),
        ),
        LbError::UpstreamTransport { .. } => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": "Connection failed" })),
        ),
        LbError::UpstreamStatus { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(serde_json::json!({ "error": err.to_string() })),
        ),
    }
}

fn extract_cpu_usage(body: &[u8]) -> Option<f64> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("cpu_usage")?
        .as_f64()
}

fn served_from_cache(body: Vec<u8>) -> Json<serde_json::Value> {
    let mut value: serde_json::Value =
        serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("status".to_string(), serde_json::json!("served_from_cache_lucky"));
        obj.insert("cpu_usage".to_string(), serde_json::json!(0));
    }
    Json(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_cpu_usage_reads_a_numeric_field() {
        let body = br#"{"server":"a","status":"handled","delay":0.1,"cpu_usage":42.5,"note":"ok"}"#;
        assert_eq!(extract_cpu_usage(body), Some(42.5));
    }

    #[test]
    fn extract_cpu_usage_is_none_for_non_json_bodies() {
        assert_eq!(extract_cpu_usage(b"not json"), None);
    }

    #[test]
    fn served_from_cache_overrides_status_and_cpu_usage() {
        let body = br#"{"server":"a","status":"handled","delay":0.1,"cpu_usage":42.5,"note":"ok"}"#.to_vec();
        let Json(value) = served_from_cache(body);
        assert_eq!(value["status"], "served_from_cache_lucky");
        assert_eq!(value["cpu_usage"], 0);
        assert_eq!(value["server"], "a");
    }

    #[test]
    fn no_eligible_replica_maps_to_a_system_failure_503() {
        let (status, Json(value)) = lb_error_response(&LbError::NoEligibleReplica);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(value["status"], "system_failure");
    }

    #[test]
    fn upstream_transport_failure_maps_to_a_502() {
        let (status, Json(value)) = lb_error_response(&LbError::UpstreamTransport {
            replica: "r0".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(value["error"], "Connection failed");
    }
}
