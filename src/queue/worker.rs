//! Consumer worker threads
//!
//! One worker per registered consumer. The loop is: wait for a claimable
//! message (or shutdown), run the consumer callback with no lock held,
//! then report the outcome back to the queue. A panicking callback is a
//! retryable failure, not a dead worker.

use crate::queue::work_queue::WorkQueue;
use crate::queue::traits::Consumer;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub(crate) struct ConsumerWorker {
    queue: Arc<WorkQueue>,
    consumer: Arc<dyn Consumer>,
    consumer_id: u64,
}

impl ConsumerWorker {
    pub(crate) fn new(queue: Arc<WorkQueue>, consumer: Arc<dyn Consumer>, consumer_id: u64) -> Self {
        Self {
            queue,
            consumer,
            consumer_id,
        }
    }

    /// Worker loop: Idle -> Claimed -> Executing -> Idle, until shutdown
    pub(crate) fn run(self) {
        log::debug!("consumer worker {} started", self.consumer_id);

        while let Some(message) = self.queue.next_ready(self.consumer_id) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.consumer.process(&message.body)
            }));

            let success = match outcome {
                Ok(result) => result,
                Err(_) => {
                    log::error!(
                        "consumer {} panicked while processing message {}; treating as failure",
                        self.consumer_id,
                        message.id
                    );
                    false
                }
            };

            self.queue.report_outcome(self.consumer_id, message.id, success);
        }

        log::debug!("consumer worker {} stopped", self.consumer_id);
    }
}
