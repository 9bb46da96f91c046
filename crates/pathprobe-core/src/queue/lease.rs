//! RAII lease on a dequeued task; marks the unit complete when dropped.

use crate::task::DiscoveryTask;

use super::TaskQueue;

/// A task checked out of a `TaskQueue`.
#[derive(Debug)]
pub struct Lease<'a> {
    queue: &'a TaskQueue,
    task: DiscoveryTask,
}

impl<'a> Lease<'a> {
    pub(super) fn new(queue: &'a TaskQueue, task: DiscoveryTask) -> Self {
        Self { queue, task }
    }

    pub fn task(&self) -> &DiscoveryTask {
        &self.task
    }

    pub fn task_mut(&mut self) -> &mut DiscoveryTask {
        &mut self.task
    }

    /// Put the task back on the queue, then complete this lease.
    pub fn requeue(mut self) {
        let task = std::mem::take(&mut self.task);
        self.queue.put(task);
    }

    /// Take the task out and complete this lease.
    pub fn into_task(mut self) -> DiscoveryTask {
        std::mem::take(&mut self.task)
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}
