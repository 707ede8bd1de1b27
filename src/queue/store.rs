//! Ordered store for pending messages
//!
//! A binary heap keyed by (priority desc, visible_at asc, id asc). The
//! store is a pure container: it is mutated only while the owning queue's
//! mutex is held, and it never retries or reschedules anything itself.
//!
//! Visibility is checked against the top-of-order entry only. If the
//! earliest-by-order message is not yet visible, nothing is claimable —
//! a delayed urgent message intentionally holds back lower priorities
//! until its time arrives.

use crate::queue::message::Message;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Heap adapter so the public `Message` type carries no ordering of its own
#[derive(Debug)]
struct HeapEntry(Message);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // BinaryHeap is a max-heap: "greater" entries are claimed first.
    // Higher priority wins, then earlier visible_at, then lower id.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.visible_at.cmp(&self.0.visible_at))
            .then_with(|| other.0.id.cmp(&self.0.id))
    }
}

/// Priority-ordered store of pending messages
#[derive(Debug, Default)]
pub struct OrderedWorkStore {
    heap: BinaryHeap<HeapEntry>,
}

impl OrderedWorkStore {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.heap.push(HeapEntry(message));
    }

    /// The top-of-order message, if it is already visible at `now`
    pub fn peek_earliest_visible(&self, now: Instant) -> Option<&Message> {
        self.heap.peek().map(|entry| &entry.0).filter(|m| m.is_visible(now))
    }

    /// When the top-of-order message becomes visible, for bounding waits
    pub fn next_visible_at(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.0.visible_at)
    }

    /// Remove and return the top-of-order message
    ///
    /// The caller must have validated visibility via
    /// [`peek_earliest_visible`](Self::peek_earliest_visible). Popping an
    /// empty store is a synchronisation bug and panics.
    pub fn pop(&mut self) -> Message {
        self.heap.pop().expect("popped an empty work store").0
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
