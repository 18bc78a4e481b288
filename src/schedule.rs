//! Cancellable deferred tasks on a virtual clock.
//!
//! The host event loop is modeled explicitly: the owner advances the clock and pops due tasks.
//! Every scheduled task has a handle, and cancelling through it guarantees the task never runs.

use std::collections::BTreeMap;

use crate::foundation::core::Millis;

/// Cancellation handle for a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle {
    due: Millis,
    seq: u64,
}

impl TaskHandle {
    /// Clock time at which the task is due.
    pub fn due(self) -> Millis {
        self.due
    }
}

/// Single-threaded scheduler of deferred tasks.
///
/// Tasks fire in `(due, scheduling order)` order.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Millis,
    next_seq: u64,
    queue: BTreeMap<TaskHandle, T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Millis::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    /// Empty scheduler at `Millis::ZERO`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Number of tasks still waiting.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Return `true` while `handle` has neither fired nor been cancelled.
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.queue.contains_key(&handle)
    }

    /// Schedule `task` to run `delay` after the current clock time.
    pub fn schedule(&mut self, delay: Millis, task: T) -> TaskHandle {
        let handle = TaskHandle {
            due: self.now.saturating_add(delay),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(handle, task);
        handle
    }

    /// Cancel a task. Returns `false` when it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.queue.remove(&handle).is_some()
    }

    /// Pop the earliest task due at or before `until`, moving the clock to its due time.
    ///
    /// Returns `None` once nothing is due; the clock is then left untouched so the caller can
    /// finish the advance with [`Scheduler::set_now`].
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, T)> {
        let (&handle, _) = self.queue.first_key_value()?;
        if handle.due > until {
            return None;
        }
        let task = self.queue.remove(&handle)?;
        self.now = self.now.max(handle.due);
        Some((handle.due, task))
    }

    /// Move the clock forward. Moving backwards is ignored.
    pub fn set_now(&mut self, t: Millis) {
        self.now = self.now.max(t);
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
