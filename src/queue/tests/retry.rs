//! Retry and dead-letter tests

use crate::queue::tests::support::{fast_config, wait_until};
use crate::queue::WorkQueue;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_fails_twice_then_succeeds() {
    let queue = Arc::new(WorkQueue::new(fast_config()));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            // Fail the first two deliveries, succeed on the third
            counter.fetch_add(1, Ordering::SeqCst) >= 2
        }))
        .unwrap();

    queue.publish("flaky".to_string(), 0, Duration::ZERO).unwrap();

    assert!(wait_until(Duration::from_secs(3), || {
        queue.stats().unwrap().acknowledged == 1
    }));
    queue.shutdown();

    let stats = queue.stats().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(stats.retried, 2);
    assert_eq!(stats.acknowledged, 1);
    assert_eq!(stats.dead_lettered, 0);
    assert!(queue.dead_letters().unwrap().is_empty());
}

#[test]
fn test_exhausted_retries_move_message_to_dead_letters() {
    let queue = Arc::new(WorkQueue::new(fast_config()));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        }))
        .unwrap();

    let id = queue.publish("poison".to_string(), 0, Duration::ZERO).unwrap();

    assert!(wait_until(Duration::from_secs(3), || {
        queue.stats().unwrap().dead_lettered == 1
    }));

    // max_retries = 3: exactly three deliveries, then never claimed again
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let dead = queue.dead_letters().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].id, id);
    assert_eq!(dead[0].body, "poison");
    assert_eq!(dead[0].attempt, 2, "two retries were recorded before the final failure");

    let stats = queue.stats().unwrap();
    assert_eq!(stats.retried, 2);
    assert_eq!(stats.acknowledged, 0);
    assert_eq!(stats.pending, 0);

    queue.shutdown();
}

#[test]
fn test_panicking_consumer_is_a_retryable_failure() {
    let queue = Arc::new(WorkQueue::new(fast_config()));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("consumer blew up");
            }
            true
        }))
        .unwrap();

    queue.publish("boom".to_string(), 0, Duration::ZERO).unwrap();

    assert!(wait_until(Duration::from_secs(3), || {
        queue.stats().unwrap().acknowledged == 1
    }));
    queue.shutdown();

    let stats = queue.stats().unwrap();
    assert_eq!(stats.retried, 1);
    assert_eq!(stats.dead_lettered, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
