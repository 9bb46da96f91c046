//! CLI command handlers, one per file.

mod baseline;
mod paths_file;
mod scan;

pub use baseline::run_baseline;
pub use paths_file::load_candidates;
#[cfg(test)]
pub use paths_file::parse_candidates;
pub use scan::run_scan;
