//! Shared FIFO of discovery tasks with completion accounting.
//!
//! Every task handed out by `pop` comes wrapped in a `Lease`; dropping the
//! lease marks the unit complete, so each dequeue is completed exactly once
//! whatever the worker decides. A requeue adds a new unit before the old lease
//! completes. `join` returns when every unit ever enqueued has completed.
//!
//! Idle workers block in `pop` instead of polling. `close` is the cancellation
//! signal: it discards pending tasks and wakes every blocked worker.

mod lease;

pub use lease::Lease;

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::task::DiscoveryTask;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<DiscoveryTask>,
    /// Units enqueued but not yet completed (pending + leased).
    unfinished: usize,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    drained: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: impl IntoIterator<Item = DiscoveryTask>) -> Self {
        let queue = Self::new();
        for task in tasks {
            queue.put(task);
        }
        queue
    }

    /// Enqueue a task. Ignored once the queue is closed.
    pub fn put(&self, task: DiscoveryTask) {
        let mut state = self.lock();
        if state.closed {
            tracing::debug!(url = %task.url, "queue closed; dropping task");
            return;
        }
        state.items.push_back(task);
        state.unfinished += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Block until a task is available. Returns `None` once the queue is closed.
    pub fn pop(&self) -> Option<Lease<'_>> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(task) = state.items.pop_front() {
                return Some(Lease::new(self, task));
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Non-blocking variant of `pop`.
    pub fn try_pop(&self) -> Option<Lease<'_>> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.items.pop_front().map(|task| Lease::new(self, task))
    }

    /// Cancel: discard pending tasks and wake all blocked `pop` and `join` callers.
    /// Tasks already leased still complete normally.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        let discarded = state.items.len();
        state.items.clear();
        state.unfinished -= discarded;
        let drained = state.unfinished == 0;
        drop(state);
        if discarded > 0 {
            tracing::debug!(discarded, "queue closed with pending tasks");
        }
        self.available.notify_all();
        if drained {
            self.drained.notify_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Block until every enqueued unit (retries included) has completed.
    pub fn join(&self) {
        let mut state = self.lock();
        while state.unfinished > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Pending tasks not yet handed out.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Units enqueued but not yet completed.
    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }

    fn task_done(&self) {
        let mut state = self.lock();
        state.unfinished = state.unfinished.saturating_sub(1);
        let drained = state.unfinished == 0;
        drop(state);
        if drained {
            self.drained.notify_all();
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
