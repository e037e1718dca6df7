use serde::Serialize;

/// The body a simulated replica returns for a healthy request.
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedResponse {
    pub server: String,
    pub status: &'static str,
    pub delay: f64,
    pub cpu_usage: f64,
    pub note: &'static str,
}

/// The body returned for a 503: `"crashed"` while already within a crash
/// window, `"crashed_now"` for the request whose overload streak just
/// tripped the breaker.
#[derive(Debug, Clone, Serialize)]
pub struct CrashedResponse {
    pub server: String,
    pub status: &'static str,
}
