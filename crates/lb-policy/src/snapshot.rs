/// A point-in-time copy of the fields a policy needs from one eligible
/// replica. Snapshots are taken without locking across replicas, so a
/// policy's view of the pool may already be stale by the time it returns —
/// that is expected and matches the "no happens-before" guarantee between a
/// decision and the next state update.
#[derive(Debug, Clone, Copy)]
pub struct ReplicaSnapshot {
    /// Index into the caller's eligible-replica slice, not the full pool.
    pub index: usize,
    pub weight: f64,
    pub active_conns: u64,
    pub avg_latency: f64,
    pub peak_ewma_latency: f64,
    pub cpu_usage: f64,
}
