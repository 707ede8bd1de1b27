//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue has been shut down")]
    Stopped,

    #[error("Subscription not found: {name}")]
    SubscriptionNotFound { name: String },

    #[error("Offset out of range: {offset} (messages published: {published})")]
    OffsetOutOfRange { offset: usize, published: usize },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
