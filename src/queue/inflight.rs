//! Tracking for messages currently being processed
//!
//! Each claimed message is held here with a delivery deadline. A consumer
//! that reports an outcome releases its entry; one that goes silent past
//! the deadline has its entry swept out and the message handed back to
//! the caller for re-queueing. Mutated only under the owning queue's
//! mutex, like the pending store.

use crate::queue::message::Message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A message claimed by a consumer, awaiting an outcome report
#[derive(Debug, Clone)]
pub struct InFlightEntry {
    pub message: Arc<Message>,
    pub consumer_id: u64,
    pub deadline: Instant,
}

/// Tracker for all in-flight messages of one queue
#[derive(Debug, Default)]
pub struct InFlightTracker {
    entries: HashMap<u64, InFlightEntry>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn track(&mut self, message: Arc<Message>, consumer_id: u64, deadline: Instant) {
        self.entries.insert(
            message.id,
            InFlightEntry {
                message,
                consumer_id,
                deadline,
            },
        );
    }

    /// Remove the entry for a reported outcome
    ///
    /// The release is attributed: it only succeeds when the entry was
    /// claimed by the reporting consumer. Returns `None` when the sweep
    /// already reclaimed the message (and possibly another consumer has
    /// re-claimed it under the same id); a late outcome report then has
    /// nothing to act on.
    pub fn release(&mut self, message_id: u64, consumer_id: u64) -> Option<InFlightEntry> {
        match self.entries.get(&message_id) {
            Some(entry) if entry.consumer_id == consumer_id => self.entries.remove(&message_id),
            _ => None,
        }
    }

    /// Remove and return the messages of all entries past their deadline
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<Arc<Message>> {
        let expired: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .map(|entry| entry.message)
            .collect()
    }

    /// The earliest delivery deadline, for bounding waits
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|entry| entry.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
