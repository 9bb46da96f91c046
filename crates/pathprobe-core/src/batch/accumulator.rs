//! Where valid batch entries end up.

use crate::output::OutputSink;
use crate::task::{ResultCollection, ValidPathResult};

use super::ProbeEntry;

/// Receives every entry that passed the validity filter.
pub trait Accumulator {
    fn add_entry(&mut self, entry: ProbeEntry);
}

impl Accumulator for Vec<ProbeEntry> {
    fn add_entry(&mut self, entry: ProbeEntry) {
        self.push(entry);
    }
}

/// Reports hits and appends them to the shared result collection.
/// Protected entries are reported but never stored.
#[derive(Debug, Clone)]
pub struct ResultAccumulator {
    results: ResultCollection,
    output: OutputSink,
    echo_hits: bool,
}

impl ResultAccumulator {
    pub fn new(results: ResultCollection, output: OutputSink, echo_hits: bool) -> Self {
        Self {
            results,
            output,
            echo_hits,
        }
    }

    pub fn results(&self) -> &ResultCollection {
        &self.results
    }
}

impl Accumulator for ResultAccumulator {
    fn add_entry(&mut self, entry: ProbeEntry) {
        if entry.flags.protected {
            if self.echo_hits {
                self.output.protected(&entry.task.description, &entry.url);
            }
            return;
        }
        if self.echo_hits {
            self.output
                .found(&entry.task.description, &entry.url, entry.flags.string_match);
        }
        self.results.push(ValidPathResult {
            task: entry.task,
            status: entry.status,
            protected: false,
            string_matched: entry.flags.string_match,
        });
    }
}
