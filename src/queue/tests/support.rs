//! Shared helpers for the queue tests

use std::time::{Duration, Instant};

/// Poll `predicate` every few milliseconds until it holds or `deadline`
/// elapses. Returns whether the predicate became true.
pub fn wait_until(deadline: Duration, predicate: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

/// A queue config with short intervals so retry/timeout tests run fast
pub fn fast_config() -> crate::queue::QueueConfig {
    crate::queue::QueueConfig {
        max_retries: 3,
        visibility_timeout: Duration::from_millis(150),
        retry_backoff: Duration::from_millis(20),
        reclaim_delay: Duration::from_millis(10),
    }
}
