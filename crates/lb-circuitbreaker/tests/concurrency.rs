use lb_circuitbreaker::{CircuitBreakerSettings, Gate};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn concurrent_crash_and_eligibility_reads_do_not_panic() {
    let settings = CircuitBreakerSettings::builder()
        .recovery_window(Duration::from_millis(20))
        .build();
    let gate = Arc::new(Gate::new(&settings));

    let writer = {
        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            for _ in 0..200 {
                gate.mark_crashed(Instant::now());
                gate.mark_healthy();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let gate = Arc::clone(&gate);
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let _ = gate.is_eligible(true, Instant::now());
            }
        }));
    }

    writer.await.unwrap();
    for r in readers {
        r.await.unwrap();
    }
}

#[tokio::test]
async fn no_request_is_forwarded_during_recovery_window() {
    let settings = CircuitBreakerSettings::builder()
        .recovery_window(Duration::from_millis(100))
        .build();
    let gate = Gate::new(&settings);

    let crash_time = Instant::now();
    gate.mark_crashed(crash_time);

    // Sample the window densely; every sample before the deadline must be
    // excluded, matching the universally quantified invariant that no
    // request is forwarded to a crashed replica during [t, t + window).
    let mut t = crash_time;
    while t < crash_time + Duration::from_millis(99) {
        assert!(!gate.is_eligible(true, t));
        t += Duration::from_millis(10);
    }
    assert!(gate.is_eligible(true, crash_time + Duration::from_millis(101)));
}
