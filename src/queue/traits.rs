//! Traits for the queue system
//!
//! The `Consumer` trait is the capability the queue depends on: domain
//! work behind a success/failure report. Implementations must tolerate
//! concurrent invocation from different worker threads for different
//! messages and must not assume any particular thread.

/// Domain work invoked by a consumer worker for each claimed message
///
/// Returning `false` (or panicking) marks the delivery as a retryable
/// failure; the queue applies its retry/backoff policy and eventually
/// dead-letters the message if attempts are exhausted.
///
/// # Example
///
/// ```rust
/// use dispatchq::queue::Consumer;
///
/// struct Uppercaser;
///
/// impl Consumer for Uppercaser {
///     fn process(&self, body: &str) -> bool {
///         println!("{}", body.to_uppercase());
///         true
///     }
/// }
/// ```
pub trait Consumer: Send + Sync {
    /// Process one message body, reporting success or retryable failure
    fn process(&self, body: &str) -> bool;
}

/// Plain closures work as consumers, mirroring callback-style callers
impl<F> Consumer for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn process(&self, body: &str) -> bool {
        self(body)
    }
}
