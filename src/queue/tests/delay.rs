//! Delay tests: a message is never claimed before `enqueued_at + delay`

use crate::queue::tests::support::wait_until;
use crate::queue::{QueueConfig, WorkQueue};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn test_delayed_message_is_not_claimed_early() {
    let queue = Arc::new(WorkQueue::new(QueueConfig::default()));
    let delay = Duration::from_millis(400);

    let claimed_at: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&claimed_at);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            *sink.lock().unwrap() = Some(Instant::now());
            true
        }))
        .unwrap();

    let published_at = Instant::now();
    queue.publish("later".to_string(), 0, delay).unwrap();

    assert!(wait_until(Duration::from_secs(3), || claimed_at
        .lock()
        .unwrap()
        .is_some()));
    queue.shutdown();

    let elapsed = claimed_at.lock().unwrap().unwrap() - published_at;
    assert!(
        elapsed >= delay,
        "claimed after {:?}, before the {:?} delay elapsed",
        elapsed,
        delay
    );
    // The worker bounds its wait by the next visible_at, so pickup should
    // be prompt once the delay expires.
    assert!(
        elapsed < delay + Duration::from_millis(700),
        "claimed only after {:?}; delayed pickup is too slow",
        elapsed
    );
}

#[test]
#[ignore = "slow"]
fn test_two_second_delay_is_honored() {
    let queue = Arc::new(WorkQueue::new(QueueConfig::default()));
    let delay = Duration::from_millis(2000);

    let claimed_at: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&claimed_at);
    queue
        .register_consumer(Arc::new(move |_: &str| {
            *sink.lock().unwrap() = Some(Instant::now());
            true
        }))
        .unwrap();

    let published_at = Instant::now();
    queue.publish("in two seconds".to_string(), 0, delay).unwrap();

    assert!(wait_until(Duration::from_secs(5), || claimed_at
        .lock()
        .unwrap()
        .is_some()));
    queue.shutdown();

    let elapsed = claimed_at.lock().unwrap().unwrap() - published_at;
    assert!(elapsed >= delay);
    assert!(elapsed < delay + Duration::from_millis(700));
}

#[test]
fn test_ready_message_preempted_by_delayed_urgent_one() {
    let queue = Arc::new(WorkQueue::new(QueueConfig::default()));

    // The delayed priority-9 message is earliest-by-order, so the ready
    // priority-0 message must wait for it.
    queue
        .publish("urgent".to_string(), 9, Duration::from_millis(200))
        .unwrap();
    queue.publish("ready".to_string(), 0, Duration::ZERO).unwrap();

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    queue
        .register_consumer(Arc::new(move |body: &str| {
            sink.lock().unwrap().push(body.to_string());
            true
        }))
        .unwrap();

    assert!(wait_until(Duration::from_secs(2), || seen.lock().unwrap().len() == 2));
    queue.shutdown();

    assert_eq!(*seen.lock().unwrap(), vec!["urgent", "ready"]);
}
