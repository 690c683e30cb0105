//! Idle-time prefetch queue ordered by priority.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::util::serde::{Priority, UnitId};

/// Queued unit, ordered by priority (highest first) and FIFO within a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueuedUnit {
    id: UnitId,
    priority: Priority,
    seq: u64,
}

impl PartialOrd for QueuedUnit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedUnit {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.priority.cmp(&other.priority) {
            // Earlier enqueue wins (reversed for max-heap).
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

/// Units waiting for an idle period, each queued at most once.
#[derive(Debug, Default)]
pub struct PrefetchQueue {
    heap: BinaryHeap<QueuedUnit>,
    queued: HashSet<UnitId>,
    next_seq: u64,
}

impl PrefetchQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a unit. Returns false if it was already queued.
    pub fn push(&mut self, id: UnitId, priority: Priority) -> bool {
        if !self.queued.insert(id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedUnit { id, priority, seq });
        true
    }

    /// Next unit to fetch.
    pub fn pop(&mut self) -> Option<UnitId> {
        let unit = self.heap.pop()?;
        self.queued.remove(&unit.id);
        Some(unit.id)
    }

    /// Number of queued units.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
