//! Public API for the queue system
//!
//! External modules should import from here rather than directly from
//! internal modules. See the module documentation for usage examples.

// Core queue components
pub use crate::queue::work_queue::{QueueConfig, QueueStats, WorkQueue};

// Message type
pub use crate::queue::message::Message;

// Ordered store, in-flight tracking and dead letters (useful standalone)
pub use crate::queue::dead_letter::DeadLetterStore;
pub use crate::queue::inflight::{InFlightEntry, InFlightTracker};
pub use crate::queue::store::OrderedWorkStore;

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Traits
pub use crate::queue::traits::Consumer;
