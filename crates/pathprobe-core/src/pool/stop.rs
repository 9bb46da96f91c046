//! Cooperative shutdown for the worker pool.
//!
//! Stopping closes whichever queue the pool is currently draining; workers
//! blocked in `TaskQueue::pop` wake up and exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::queue::TaskQueue;

#[derive(Debug, Default)]
struct StopState {
    stopped: AtomicBool,
    active: Mutex<Option<Arc<TaskQueue>>>,
}

/// Clonable handle used to cancel a running scan from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    inner: Arc<StopState>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Pending tasks are discarded; in-flight fetches finish.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        if let Some(queue) = self.active().as_ref() {
            queue.close();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Make `queue` the one `stop` closes. Closes it at once if already stopped.
    pub(super) fn attach(&self, queue: &Arc<TaskQueue>) {
        *self.active() = Some(Arc::clone(queue));
        if self.is_stopped() {
            queue.close();
        }
    }

    pub(super) fn detach(&self) {
        self.active().take();
    }

    fn active(&self) -> std::sync::MutexGuard<'_, Option<Arc<TaskQueue>>> {
        self.inner.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Closes the queue if the owning worker thread unwinds, so `join` on the
/// coordinator cannot wait forever on tasks nobody will take.
pub(super) struct CloseOnPanic<'a>(pub(super) &'a TaskQueue);

impl Drop for CloseOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.close();
        }
    }
}
