pub mod config;
pub mod error;
pub mod logging;

pub mod batch;
pub mod fetch;
pub mod fingerprint;
pub mod output;
pub mod policy;
pub mod pool;
pub mod queue;
pub mod report;
pub mod retry;
pub mod task;

pub use error::ScanError;
pub use report::ScanReport;
pub use task::{DiscoveryTask, ResultCollection, ValidPathResult};
