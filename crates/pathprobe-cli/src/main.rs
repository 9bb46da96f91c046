use clap::Parser;
use pathprobe_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Fall back to stderr when the state directory is unwritable.
    if let Err(e) = logging::init_logging(cli.debug) {
        logging::init_logging_stderr(cli.debug);
        tracing::warn!("file logging unavailable: {:#}", e);
    }

    if let Err(err) = cli.run().await {
        eprintln!("pathprobe error: {:#}", err);
        std::process::exit(1);
    }
}
