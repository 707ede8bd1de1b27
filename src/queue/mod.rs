//! Work Distribution Queue Component
//!
//! A priority-ordered, delay-aware work queue feeding one or more consumer
//! worker threads, with acknowledgement, retry/backoff, visibility-timeout
//! redelivery and dead-lettering. Key properties:
//!
//! - **Priority + delay ordering**: visible messages are served by
//!   priority (descending), then scheduled time, then publish order
//! - **Multiple consumers**: each registered consumer gets a dedicated
//!   worker thread; callbacks run outside the queue lock
//! - **At-least-once delivery**: a claimed message that is never
//!   acknowledged becomes visible again after the visibility timeout
//! - **Bounded retries**: failed messages retry with exponential backoff
//!   until `max_retries`, then park in the dead-letter store
//!
//! # Architecture
//!
//! ```text
//! publish(body, priority, delay)
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ WorkQueue (one mutex + condvar)                      │
//! │  ┌─────────────────┐  claim   ┌──────────────────┐  │
//! │  │ OrderedWorkStore ├─────────►│ InFlightTracker  │  │
//! │  │ (pending, heap)  │◄─────────┤ (deadline per    │  │
//! │  └─────────────────┘  retry /  │  claimed message)│  │
//! │            ▲           timeout └────────┬─────────┘  │
//! │            │                            │ retries    │
//! │            │                            ▼ exhausted  │
//! │            │                  ┌──────────────────┐   │
//! │            └─ backoff         │ DeadLetterStore  │   │
//! │                               └──────────────────┘   │
//! └──────────────────────────────────────────────────────┘
//!        ▲ wait/notify                  │ outcome
//! ┌──────┴──────┐  ┌─────────────┐  ┌───┴─────────┐
//! │ConsumerWorker│  │ConsumerWorker│  │ConsumerWorker│  (one thread each)
//! └─────────────┘  └─────────────┘  └─────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use dispatchq::queue::{QueueConfig, WorkQueue};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = Arc::new(WorkQueue::new(QueueConfig::default()));
//!
//! queue.register_consumer(Arc::new(|body: &str| {
//!     println!("processing {}", body);
//!     true
//! }))?;
//!
//! queue.publish("urgent".to_string(), 5, Duration::ZERO)?;
//! queue.publish("later".to_string(), 0, Duration::from_millis(500))?;
//!
//! // ... eventually
//! queue.shutdown();
//! # Ok(())
//! # }
//! ```

mod dead_letter;
mod error;
mod inflight;
mod message;
mod store;
mod traits;
mod work_queue;
mod worker;

pub use dead_letter::DeadLetterStore;
pub use error::{QueueError, QueueResult};
pub use inflight::{InFlightEntry, InFlightTracker};
pub use message::Message;
pub use store::OrderedWorkStore;
pub use traits::Consumer;
pub use work_queue::{QueueConfig, QueueStats, WorkQueue};

pub mod api;

#[cfg(test)]
mod tests;
