//! Message Types for the Work Queue
//!
//! Messages are immutable once handed to a consumer: retries, visibility
//! reclaims and recurring re-admissions all construct a new value with
//! updated scheduling fields rather than mutating in place.

use std::time::{Duration, Instant};

/// One unit of work plus its scheduling metadata
///
/// The id is unique and monotonic, assigned under the queue lock at
/// publish time. A message is eligible for delivery once `now` has
/// reached `visible_at`; among visible messages the queue serves
/// highest priority first, then earliest `visible_at`, then lowest id.
#[derive(Debug, Clone)]
pub struct Message {
    /// Unique monotonic identifier assigned at publish
    pub id: u64,
    /// Opaque payload (application-specific data)
    pub body: String,
    /// Higher priority is served first among visible messages
    pub priority: i32,
    /// When the message was published
    pub enqueued_at: Instant,
    /// Delay before the message first became visible
    pub delay: Duration,
    /// Earliest time the message may be delivered
    pub visible_at: Instant,
    /// Delivery attempts so far; incremented on each reported failure
    pub attempt: u32,
    /// Re-admission period for recurring messages, `None` for one-shot
    pub interval: Option<Duration>,
}

impl Message {
    pub(crate) fn new(
        id: u64,
        body: String,
        priority: i32,
        delay: Duration,
        interval: Option<Duration>,
    ) -> Self {
        let enqueued_at = Instant::now();
        Self {
            id,
            body,
            priority,
            enqueued_at,
            delay,
            visible_at: enqueued_at + delay,
            attempt: 0,
            interval,
        }
    }

    /// Whether the message is eligible for delivery at `now`
    pub fn is_visible(&self, now: Instant) -> bool {
        now >= self.visible_at
    }

    /// Successor value for a failed delivery: one more attempt, visible
    /// again after the backoff.
    pub(crate) fn retried(&self, backoff: Duration, now: Instant) -> Self {
        Self {
            attempt: self.attempt + 1,
            visible_at: now + backoff,
            ..self.clone()
        }
    }

    /// Successor value for a visibility-timeout reclaim. The consumer
    /// never reported an outcome, so the attempt count is unchanged.
    pub(crate) fn reclaimed(&self, requeue_delay: Duration, now: Instant) -> Self {
        Self {
            visible_at: now + requeue_delay,
            ..self.clone()
        }
    }

    /// Successor value for the next occurrence of a recurring message.
    pub(crate) fn next_occurrence(&self, interval: Duration, now: Instant) -> Self {
        Self {
            attempt: 0,
            visible_at: now + interval,
            ..self.clone()
        }
    }
}
