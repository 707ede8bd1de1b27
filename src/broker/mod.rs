//! Broker - fan-out over independent subscriptions
//!
//! A broker routes every published message to each registered
//! subscription. A subscription is an independent [`WorkQueue`] with its
//! own consumer set, retry state and dead letters; a failure in one
//! subscription never affects another, and there is no cross-subscription
//! ordering guarantee.
//!
//! [`WorkQueue`]: crate::queue::WorkQueue

mod broker;

pub use broker::Broker;
