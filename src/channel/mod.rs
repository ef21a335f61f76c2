//! Bounded FIFO channel between producers and a drain worker.
//!
//! # Responsibilities
//! - Accept items from any application thread without blocking
//! - Hand the entire pending batch to the drain worker atomically
//! - Enforce the overflow policy: discard everything and report once
//!
//! # Design Decisions
//! - Mutex-guarded VecDeque; producers and the drain worker may race freely
//! - Enqueue never blocks and never fails visibly (best-effort telemetry)
//! - The watermark is checked at drain time, matching the lossy-by-design
//!   policy: a burst either fits or the whole batch is discarded and
//!   self-reported as one Major diagnostic by the caller

use std::collections::VecDeque;
use std::sync::Mutex;

/// Default capacity watermark for every telemetry channel.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Outcome of draining a channel.
#[derive(Debug, PartialEq, Eq)]
pub enum Drain<T> {
    /// Everything that was pending, in arrival order. May be empty.
    Batch(Vec<T>),
    /// The watermark was reached: contents were discarded.
    Overflowed { discarded: usize },
}

/// A bounded FIFO buffer shared between producer threads and one drain
/// worker. Capacity is fixed at construction.
pub struct BoundedChannel<T> {
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an item to the tail. Never blocks on channel fullness; an
    /// over-watermark backlog is resolved at the next drain.
    pub fn enqueue(&self, item: T) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.push_back(item);
    }

    /// Atomically remove and return every pending item, or report an
    /// overflow if the pending count reached the watermark.
    pub fn drain_all(&self) -> Drain<T> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        // An empty drain is side-effect free; the watermark only applies
        // to pending work.
        if queue.is_empty() {
            return Drain::Batch(Vec::new());
        }
        if queue.len() >= self.capacity {
            let discarded = queue.len();
            queue.clear();
            return Drain::Overflowed { discarded };
        }
        Drain::Batch(queue.drain(..).collect())
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
