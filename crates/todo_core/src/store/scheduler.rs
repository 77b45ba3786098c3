//! Virtual-time job queue.
//!
//! Time only moves when the owner asks for it, which keeps deferred commits
//! deterministic in tests and in the CLI driver.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<T> {
    fire_at_ms: u64,
    seq: u64,
    job: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at_ms == other.fire_at_ms && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on (fire_at_ms, seq): equal due times pop in FIFO order.
        other
            .fire_at_ms
            .cmp(&self.fire_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending jobs ordered by due time.
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    queue: BinaryHeap<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates an empty scheduler at virtual time zero.
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queues `job` to fire `delay` after the current virtual time.
    pub fn schedule(&mut self, delay: Duration, job: T) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let fire_at_ms = self.now_ms.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            fire_at_ms,
            seq,
            job,
        });
    }

    /// Due time of the earliest pending job.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.peek().map(|entry| entry.fire_at_ms)
    }

    /// Pops the earliest job due at or before `target_ms`.
    ///
    /// The clock moves to the job's due time, so work scheduled by the job
    /// is measured from when it fired.
    pub fn pop_due(&mut self, target_ms: u64) -> Option<T> {
        if self.next_due_ms()? > target_ms {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now_ms = self.now_ms.max(entry.fire_at_ms);
        Some(entry.job)
    }

    /// Moves the clock forward to `target_ms`; never moves it backward.
    pub fn advance_to(&mut self, target_ms: u64) {
        self.now_ms = self.now_ms.max(target_ms);
    }
}
