//! Discovery tasks and the shared collection of confirmed paths.

use std::sync::{Arc, Mutex, MutexGuard};

/// Path that is only used to seed the baseline and is never classified.
pub const ROOT_PATH: &str = "/";

/// One candidate path under test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryTask {
    /// Path relative to the host root (e.g. `/admin`).
    pub url: String,
    /// Human label used when reporting a hit.
    pub description: String,
    /// Literal that must appear in the body (case-insensitive) to confirm a hit.
    pub match_string: Option<String>,
    /// Number of times this task was requeued after a transport failure.
    pub timeout_count: u32,
    /// Not-found fingerprint of this directory, filled in by the baseline phase.
    /// Only the root value is ever consulted (it becomes the baseline).
    pub computed_404_crc: Option<u32>,
}

impl DiscoveryTask {
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
            match_string: None,
            timeout_count: 0,
            computed_404_crc: None,
        }
    }

    /// Root directory task used to seed the baseline.
    pub fn root() -> Self {
        Self::new(ROOT_PATH, "root")
    }

    pub fn with_match_string(mut self, needle: impl Into<String>) -> Self {
        self.match_string = Some(needle.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.url == ROOT_PATH
    }
}

/// A confirmed path plus how it was confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPathResult {
    pub task: DiscoveryTask,
    pub status: u32,
    /// Always false for entries in a `ResultCollection`: 401s are reported, not kept.
    pub protected: bool,
    pub string_matched: bool,
}

/// Append-only, thread-safe collection of confirmed paths.
///
/// Cloning shares the same underlying storage; this is what the recursive
/// expansion step reads once a run is over.
#[derive(Debug, Clone, Default)]
pub struct ResultCollection {
    inner: Arc<Mutex<Vec<ValidPathResult>>>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: ValidPathResult) {
        self.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of everything appended so far.
    pub fn snapshot(&self) -> Vec<ValidPathResult> {
        self.lock().clone()
    }

    // A worker that panicked mid-push cannot leave a half-written Vec entry,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, Vec<ValidPathResult>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_task_is_root() {
        assert!(DiscoveryTask::root().is_root());
        assert!(!DiscoveryTask::new("/admin", "Admin").is_root());
    }

    #[test]
    fn collection_clones_share_storage() {
        let results = ResultCollection::new();
        let other = results.clone();
        other.push(ValidPathResult {
            task: DiscoveryTask::new("/a", "A"),
            status: 200,
            protected: false,
            string_matched: false,
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results.snapshot()[0].task.url, "/a");
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let results = ResultCollection::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let results = results.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        results.push(ValidPathResult {
                            task: DiscoveryTask::new(format!("/{t}/{i}"), "x"),
                            status: 200,
                            protected: false,
                            string_matched: false,
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(results.len(), 400);
    }
}
