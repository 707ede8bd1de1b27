//! Lifecycle tests: terminal states, shutdown semantics, recurrence

use crate::queue::tests::support::{fast_config, wait_until};
use crate::queue::{QueueConfig, WorkQueue};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_every_message_reaches_exactly_one_terminal_state() {
    let queue = Arc::new(WorkQueue::new(fast_config()));

    // The first delivery of every body fails, the retry succeeds,
    // whichever consumer picks it up. With max_retries = 3 everything
    // lands in Done eventually.
    let seen: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    for _ in 0..3 {
        let seen = Arc::clone(&seen);
        queue
            .register_consumer(Arc::new(move |body: &str| {
                !seen.lock().unwrap().insert(body.to_string())
            }))
            .unwrap();
    }

    let total = 50;
    for i in 0..total {
        queue
            .publish(format!("job-{}", i), (i % 5) as i32, Duration::ZERO)
            .unwrap();
    }

    assert!(wait_until(Duration::from_secs(5), || {
        queue.stats().unwrap().acknowledged == total
    }));
    queue.shutdown();

    let stats = queue.stats().unwrap();
    assert_eq!(stats.acknowledged, total);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.dead_lettered, 0);
}

#[test]
fn test_shutdown_joins_idle_workers() {
    let queue = Arc::new(WorkQueue::new(QueueConfig::default()));
    queue.register_consumer(Arc::new(|_: &str| true)).unwrap();
    queue.register_consumer(Arc::new(|_: &str| true)).unwrap();

    // Both workers are blocked waiting for work; shutdown must wake and
    // join them rather than hang.
    queue.shutdown();
}

#[test]
fn test_shutdown_completes_in_progress_callback() {
    let queue = Arc::new(WorkQueue::new(QueueConfig::default()));

    let started = Arc::new(AtomicU32::new(0));
    let started_flag = Arc::clone(&started);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            started_flag.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            true
        }))
        .unwrap();

    queue.publish("slow".to_string(), 0, Duration::ZERO).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        started.load(Ordering::SeqCst) == 1
    }));

    // Shutdown while the callback is executing: it runs to completion and
    // its outcome is still recorded before the worker exits.
    queue.shutdown();
    assert_eq!(queue.stats().unwrap().acknowledged, 1);
}

#[test]
fn test_recurring_message_is_readmitted_after_success() {
    let queue = Arc::new(WorkQueue::new(fast_config()));

    let ticks = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&ticks);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }))
        .unwrap();

    queue
        .publish_recurring("tick".to_string(), 0, Duration::ZERO, Duration::from_millis(40))
        .unwrap();

    assert!(wait_until(Duration::from_secs(3), || {
        ticks.load(Ordering::SeqCst) >= 3
    }));
    queue.shutdown();

    let stats = queue.stats().unwrap();
    assert!(stats.acknowledged >= 3);
    assert_eq!(stats.dead_lettered, 0);
    // Only one logical message was ever published
    assert_eq!(stats.published, 1);
}
