//! WorkQueue - the queue facade and its state machine
//!
//! The WorkQueue owns the pending store, the in-flight tracker and the
//! dead-letter store behind a single mutex, and coordinates the consumer
//! worker threads through one condition variable. Per-message lifecycle:
//!
//! ```text
//! Pending -> InFlight -> { Done | Pending (retry) | DeadLettered }
//! ```
//!
//! Consumer callbacks always run outside the lock; the lock is re-taken
//! only to report the outcome. Waits are bounded by the earlier of "next
//! pending message becomes visible" and "next in-flight deadline", so
//! delayed messages and silent consumers are both picked up promptly
//! without busy-polling.
//!
//! # Thread Safety
//!
//! The WorkQueue is fully thread-safe and is shared across threads as
//! `Arc<WorkQueue>`. All state mutation happens under the queue mutex;
//! the `Message` values handed out are immutable.

use crate::core::sync::handle_mutex_poison;
use crate::queue::dead_letter::DeadLetterStore;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::inflight::InFlightTracker;
use crate::queue::message::Message;
use crate::queue::store::OrderedWorkStore;
use crate::queue::traits::Consumer;
use crate::queue::worker::ConsumerWorker;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Tuning knobs for one queue
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Delivery attempts before a failing message is dead-lettered
    pub max_retries: u32,
    /// How long a claimed message stays invisible before it is presumed
    /// abandoned and returned to pending
    pub visibility_timeout: Duration,
    /// Base backoff before a failed message becomes visible again;
    /// doubles with each attempt
    pub retry_backoff: Duration,
    /// Delay before a reclaimed (timed-out) message becomes visible
    pub reclaim_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            visibility_timeout: Duration::from_millis(2000),
            retry_backoff: Duration::from_millis(500),
            reclaim_delay: Duration::from_millis(200),
        }
    }
}

impl QueueConfig {
    /// Exponential backoff for the next retry of a message that has
    /// already failed `attempt + 1` times. Capped so the multiplier
    /// cannot overflow and the wait stays bounded.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff * (1u32 << attempt.min(6))
    }
}

/// Counters and gauges for one queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    /// Messages waiting in the pending store (visible or delayed)
    pub pending: usize,
    /// Messages currently claimed by a consumer
    pub in_flight: usize,
    /// Messages parked in the dead-letter store
    pub dead_lettered: usize,
    /// Total messages published
    pub published: u64,
    /// Total successful deliveries acknowledged
    pub acknowledged: u64,
    /// Total failed deliveries re-queued for retry
    pub retried: u64,
    /// Total visibility-timeout reclaims
    pub reclaimed: u64,
}

/// All mutable queue state, guarded by the queue mutex
struct QueueState {
    store: OrderedWorkStore,
    in_flight: InFlightTracker,
    dead_letters: DeadLetterStore,
    next_message_id: u64,
    stop: bool,
    published: u64,
    acknowledged: u64,
    retried: u64,
    reclaimed: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            store: OrderedWorkStore::new(),
            in_flight: InFlightTracker::new(),
            dead_letters: DeadLetterStore::new(),
            next_message_id: 0,
            stop: false,
            published: 0,
            acknowledged: 0,
            retried: 0,
            reclaimed: 0,
        }
    }
}

/// Priority-ordered, delay-aware work queue with retry and dead-lettering
pub struct WorkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    config: QueueConfig,
    next_consumer_id: AtomicU64,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            available: Condvar::new(),
            config,
            next_consumer_id: AtomicU64::new(0),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Publish a one-shot message
    ///
    /// Never blocks for capacity; the queue is unbounded. Fails only once
    /// shutdown has begun.
    pub fn publish(&self, body: String, priority: i32, delay: Duration) -> QueueResult<u64> {
        self.publish_message(body, priority, delay, None)
    }

    /// Publish a recurring message, re-admitted `interval` after each
    /// successful processing until it fails its way to the dead-letter
    /// store or the queue shuts down.
    pub fn publish_recurring(
        &self,
        body: String,
        priority: i32,
        delay: Duration,
        interval: Duration,
    ) -> QueueResult<u64> {
        self.publish_message(body, priority, delay, Some(interval))
    }

    fn publish_message(
        &self,
        body: String,
        priority: i32,
        delay: Duration,
        interval: Option<Duration>,
    ) -> QueueResult<u64> {
        let mut state = self.lock_state()?;
        if state.stop {
            return Err(QueueError::Stopped);
        }

        let id = state.next_message_id;
        state.next_message_id += 1;

        let message = Message::new(id, body, priority, delay, interval);
        log::debug!(
            "published message {} (priority {}, delay {:?})",
            id,
            priority,
            delay
        );
        state.store.push(message);
        state.published += 1;

        // A waiting worker may now have something claimable
        self.available.notify_all();
        Ok(id)
    }

    /// Register a consumer, spawning a dedicated worker thread bound to it
    pub fn register_consumer(self: &Arc<Self>, consumer: Arc<dyn Consumer>) -> QueueResult<()> {
        {
            let state = self.lock_state()?;
            if state.stop {
                return Err(QueueError::Stopped);
            }
        }

        let consumer_id = self.next_consumer_id.fetch_add(1, Ordering::SeqCst);
        let worker = ConsumerWorker::new(Arc::clone(self), consumer, consumer_id);
        let handle = std::thread::Builder::new()
            .name(format!("dispatchq-worker-{}", consumer_id))
            .spawn(move || worker.run())
            .map_err(|e| QueueError::OperationFailed {
                message: format!("failed to spawn worker thread: {}", e),
            })?;

        handle_mutex_poison(self.workers.lock(), |message| QueueError::OperationFailed {
            message,
        })?
        .push(handle);

        log::debug!("registered consumer {}", consumer_id);
        Ok(())
    }

    /// Block until a message is claimable or shutdown is requested
    ///
    /// Called only from worker threads. Claims the earliest visible
    /// message and moves it in-flight; returns `None` on shutdown (or a
    /// poisoned lock, which ends the worker).
    pub(crate) fn next_ready(&self, consumer_id: u64) -> Option<Arc<Message>> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::error!("queue state poisoned; worker {} exiting", consumer_id);
                return None;
            }
        };

        loop {
            if state.stop {
                return None;
            }

            let now = Instant::now();
            self.requeue_expired(&mut state, now);

            if state.store.peek_earliest_visible(now).is_some() {
                let message = Arc::new(state.store.pop());
                let deadline = now + self.config.visibility_timeout;
                state
                    .in_flight
                    .track(Arc::clone(&message), consumer_id, deadline);
                log::trace!("consumer {} claimed message {}", consumer_id, message.id);
                return Some(message);
            }

            // Sleep until something can change: a publish/outcome wakes us
            // via the condvar; a pending delay expiry or in-flight deadline
            // bounds the wait so neither needs an external nudge.
            let next_event = match (state.store.next_visible_at(), state.in_flight.next_deadline())
            {
                (Some(visible), Some(deadline)) => Some(visible.min(deadline)),
                (visible, None) => visible,
                (None, deadline) => deadline,
            };

            state = match next_event {
                Some(at) => {
                    let wait = at.saturating_duration_since(now);
                    if wait.is_zero() {
                        continue;
                    }
                    match self.available.wait_timeout(state, wait) {
                        Ok((guard, _timeout)) => guard,
                        Err(_) => {
                            log::error!("queue state poisoned; worker {} exiting", consumer_id);
                            return None;
                        }
                    }
                }
                None => match self.available.wait(state) {
                    Ok(guard) => guard,
                    Err(_) => {
                        log::error!("queue state poisoned; worker {} exiting", consumer_id);
                        return None;
                    }
                },
            };
        }
    }

    /// Record the outcome of a delivery and advance the message lifecycle
    pub(crate) fn report_outcome(&self, consumer_id: u64, message_id: u64, success: bool) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::error!("queue state poisoned; dropping outcome for message {}", message_id);
                return;
            }
        };

        let Some(entry) = state.in_flight.release(message_id, consumer_id) else {
            // The visibility sweep already reclaimed this delivery; the
            // re-queued copy owns the lifecycle from here.
            log::warn!(
                "outcome from consumer {} for message {} arrived after its visibility deadline; ignoring",
                consumer_id,
                message_id
            );
            return;
        };

        let now = Instant::now();
        let message = entry.message;

        if success {
            state.acknowledged += 1;
            log::debug!("consumer {} acknowledged message {}", consumer_id, message_id);
            if let Some(interval) = message.interval {
                state.store.push(message.next_occurrence(interval, now));
                self.available.notify_all();
            }
            return;
        }

        if message.attempt + 1 < self.config.max_retries {
            let backoff = self.config.backoff_for(message.attempt);
            log::debug!(
                "consumer {} failed message {} (attempt {}); retrying in {:?}",
                consumer_id,
                message_id,
                message.attempt + 1,
                backoff
            );
            state.retried += 1;
            state.store.push(message.retried(backoff, now));
        } else {
            log::warn!(
                "message {} exhausted {} attempts; moving to dead-letter store",
                message_id,
                message.attempt + 1
            );
            state.dead_letters.insert(message);
        }

        // A retried message may now be the new earliest
        self.available.notify_all();
    }

    /// Return expired in-flight messages to pending, attempt unchanged
    fn requeue_expired(&self, state: &mut QueueState, now: Instant) {
        let expired = state.in_flight.sweep_expired(now);
        if expired.is_empty() {
            return;
        }

        for message in expired {
            log::warn!(
                "visibility timeout for message {}; returning to pending",
                message.id
            );
            state.reclaimed += 1;
            state.store.push(message.reclaimed(self.config.reclaim_delay, now));
        }
        self.available.notify_all();
    }

    /// Current counters and gauges
    pub fn stats(&self) -> QueueResult<QueueStats> {
        let state = self.lock_state()?;
        Ok(QueueStats {
            pending: state.store.len(),
            in_flight: state.in_flight.len(),
            dead_lettered: state.dead_letters.len(),
            published: state.published,
            acknowledged: state.acknowledged,
            retried: state.retried,
            reclaimed: state.reclaimed,
        })
    }

    /// Inspect the dead-letter store, in id order
    pub fn dead_letters(&self) -> QueueResult<Vec<Arc<Message>>> {
        let state = self.lock_state()?;
        Ok(state.dead_letters.snapshot())
    }

    /// Stop all workers and wait for them to exit
    ///
    /// Workers finish any in-progress callback but claim no further work.
    /// In-flight messages at shutdown time are dropped; the queue makes no
    /// attempt to drain. Idempotent.
    pub fn shutdown(&self) {
        {
            // Shutdown must proceed even if a worker panicked with the lock
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if state.stop {
                return;
            }
            state.stop = true;
        }
        self.available.notify_all();

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self
                .workers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            workers.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
        log::info!("work queue shut down");
    }

    fn lock_state(&self) -> QueueResult<MutexGuard<'_, QueueState>> {
        handle_mutex_poison(self.state.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_service_constants() {
        let config = QueueConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.visibility_timeout, Duration::from_millis(2000));
        assert_eq!(config.retry_backoff, Duration::from_millis(500));
        assert_eq!(config.reclaim_delay, Duration::from_millis(200));
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let config = QueueConfig::default();
        assert_eq!(config.backoff_for(0), Duration::from_millis(500));
        assert_eq!(config.backoff_for(1), Duration::from_millis(1000));
        assert_eq!(config.backoff_for(2), Duration::from_millis(2000));
        // Cap keeps large attempt counts finite
        assert_eq!(config.backoff_for(50), config.backoff_for(6));
    }

    #[test]
    fn test_publish_assigns_monotonic_ids() {
        let queue = WorkQueue::new(QueueConfig::default());
        let a = queue.publish("a".to_string(), 0, Duration::ZERO).unwrap();
        let b = queue.publish("b".to_string(), 0, Duration::ZERO).unwrap();
        let c = queue.publish("c".to_string(), 5, Duration::from_millis(10)).unwrap();

        assert_eq!((a, b, c), (0, 1, 2));
        let stats = queue.stats().unwrap();
        assert_eq!(stats.published, 3);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.in_flight, 0);
    }

    #[test]
    fn test_publish_after_shutdown_is_rejected() {
        let queue = Arc::new(WorkQueue::new(QueueConfig::default()));
        queue.shutdown();

        let result = queue.publish("late".to_string(), 0, Duration::ZERO);
        assert!(matches!(result, Err(QueueError::Stopped)));

        let consumer: Arc<dyn crate::queue::Consumer> = Arc::new(|_: &str| true);
        assert!(matches!(
            queue.register_consumer(consumer),
            Err(QueueError::Stopped)
        ));
    }
}
