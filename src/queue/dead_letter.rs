//! Terminal store for messages that exhausted their retries
//!
//! Append-only: the system never removes or replays a dead letter. The
//! store exists for inspection, keyed by message id in insertion-friendly
//! ordered form so listings come out in id order.

use crate::queue::message::Message;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DeadLetterStore {
    entries: BTreeMap<u64, Arc<Message>>,
}

impl DeadLetterStore {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, message: Arc<Message>) {
        self.entries.insert(message.id, message);
    }

    pub fn contains(&self, message_id: u64) -> bool {
        self.entries.contains_key(&message_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All dead letters in id order, for inspection
    pub fn snapshot(&self) -> Vec<Arc<Message>> {
        self.entries.values().cloned().collect()
    }
}
