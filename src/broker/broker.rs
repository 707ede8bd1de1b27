//! Broker implementation: named subscriptions over independent queues

use crate::core::sync::{handle_mutex_poison, handle_rwlock_read, handle_rwlock_write};
use crate::queue::{Consumer, Message, QueueConfig, QueueError, QueueResult, QueueStats, WorkQueue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// One published message as retained for offset replay
#[derive(Debug, Clone)]
struct PublishRecord {
    body: String,
    priority: i32,
}

/// An independent delivery lane: its own queue plus a replay log
struct Subscription {
    queue: Arc<WorkQueue>,
    log: Mutex<Vec<PublishRecord>>,
}

/// Fan-out router over named subscriptions
///
/// # Example
///
/// ```rust,no_run
/// use dispatchq::broker::Broker;
/// use dispatchq::queue::{Consumer, QueueConfig};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = Broker::new(QueueConfig::default());
/// broker.register_subscription("billing", vec![Arc::new(|body: &str| {
///     println!("billing saw {}", body);
///     true
/// }) as Arc<dyn Consumer>])?;
///
/// broker.publish("order-42", 0, Duration::ZERO, None)?;
/// broker.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct Broker {
    subscriptions: RwLock<HashMap<String, Arc<Subscription>>>,
    config: QueueConfig,
}

impl Broker {
    /// Create a broker whose subscriptions all use `config`
    pub fn new(config: QueueConfig) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a subscription and its consumers
    ///
    /// Creates the subscription's queue on first registration; additional
    /// calls with the same name add consumers to the existing queue.
    pub fn register_subscription(
        &self,
        name: &str,
        consumers: Vec<Arc<dyn Consumer>>,
    ) -> QueueResult<()> {
        let subscription = {
            let mut subscriptions = self.write_subscriptions()?;
            Arc::clone(subscriptions.entry(name.to_string()).or_insert_with(|| {
                log::info!("creating subscription '{}'", name);
                Arc::new(Subscription {
                    queue: Arc::new(WorkQueue::new(self.config.clone())),
                    log: Mutex::new(Vec::new()),
                })
            }))
        };

        for consumer in consumers {
            subscription.queue.register_consumer(consumer)?;
        }
        Ok(())
    }

    /// Publish a message independently to every subscription
    ///
    /// Each subscription processes its copy at its own pace with its own
    /// retry and dead-letter state. `interval` makes the message recurring
    /// in every subscription; replay logs retain only the one-shot form.
    pub fn publish(
        &self,
        body: &str,
        priority: i32,
        delay: Duration,
        interval: Option<Duration>,
    ) -> QueueResult<()> {
        let subscriptions = self.read_subscriptions()?;
        for (name, subscription) in subscriptions.iter() {
            match interval {
                Some(every) => {
                    subscription
                        .queue
                        .publish_recurring(body.to_string(), priority, delay, every)?;
                }
                None => {
                    subscription.queue.publish(body.to_string(), priority, delay)?;
                }
            }
            handle_mutex_poison(subscription.log.lock(), |message| {
                QueueError::OperationFailed { message }
            })?
            .push(PublishRecord {
                body: body.to_string(),
                priority,
            });
            log::trace!("routed message to subscription '{}'", name);
        }
        Ok(())
    }

    /// Re-publish a subscription's retained messages from `offset` onward
    ///
    /// Replay-style rewind for the named subscription only; redelivered
    /// messages are fresh publishes with new ids. An offset at or past the
    /// number of retained messages is a usage error and nothing is
    /// replayed.
    pub fn reset_offset(&self, name: &str, offset: usize) -> QueueResult<()> {
        let subscription = self.subscription(name)?;

        let replay: Vec<PublishRecord> = {
            let log = handle_mutex_poison(subscription.log.lock(), |message| {
                QueueError::OperationFailed { message }
            })?;
            if offset >= log.len() {
                return Err(QueueError::OffsetOutOfRange {
                    offset,
                    published: log.len(),
                });
            }
            log[offset..].to_vec()
        };

        log::info!(
            "resetting subscription '{}' to offset {} ({} messages to replay)",
            name,
            offset,
            replay.len()
        );
        for record in replay {
            subscription
                .queue
                .publish(record.body, record.priority, Duration::ZERO)?;
        }
        Ok(())
    }

    /// Dead letters of one subscription, in id order
    pub fn dead_letters(&self, name: &str) -> QueueResult<Vec<Arc<Message>>> {
        self.subscription(name)?.queue.dead_letters()
    }

    /// Counters and gauges of one subscription
    pub fn stats(&self, name: &str) -> QueueResult<QueueStats> {
        self.subscription(name)?.queue.stats()
    }

    /// Registered subscription names, sorted
    pub fn subscription_names(&self) -> QueueResult<Vec<String>> {
        let subscriptions = self.read_subscriptions()?;
        let mut names: Vec<String> = subscriptions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Shut down every subscription queue, joining all worker threads
    pub fn shutdown(&self) {
        let subscriptions = match self.subscriptions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (name, subscription) in subscriptions.iter() {
            log::debug!("shutting down subscription '{}'", name);
            subscription.queue.shutdown();
        }
    }

    fn subscription(&self, name: &str) -> QueueResult<Arc<Subscription>> {
        let subscriptions = self.read_subscriptions()?;
        subscriptions
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::SubscriptionNotFound {
                name: name.to_string(),
            })
    }

    fn read_subscriptions(
        &self,
    ) -> QueueResult<std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Subscription>>>> {
        handle_rwlock_read(self.subscriptions.read(), |message| {
            QueueError::OperationFailed { message }
        })
    }

    fn write_subscriptions(
        &self,
    ) -> QueueResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Subscription>>>> {
        handle_rwlock_write(self.subscriptions.write(), |message| {
            QueueError::OperationFailed { message }
        })
    }
}
