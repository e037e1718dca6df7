/// Internal error surface for the balancer's request path.
///
/// The router maps each variant to the wire status/body documented in the
/// control-plane interface at the axum boundary; nothing downstream of
/// `select`/`forward` needs to know about HTTP status codes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LbError {
    /// The eligible set was empty at decision time.
    #[error("no eligible replica")]
    NoEligibleReplica,

    /// The upstream connection failed, reset, or timed out.
    #[error("upstream transport failure for {replica}")]
    UpstreamTransport {
        replica: String,
    },

    /// The upstream returned a non-2xx, non-503 status.
    #[error("upstream {replica} returned status {status}")]
    UpstreamStatus { replica: String, status: u16 },
}
