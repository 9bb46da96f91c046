//! CLI for the pathprobe discovery engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pathprobe_core::config::{self, Backend, ScanConfig};
use std::path::PathBuf;

use commands::{run_baseline, run_scan};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pathprobe")]
#[command(about = "pathprobe: concurrent web content discovery", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/pathprobe/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print every request and fingerprint (also raises the log level).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Threads,
    Async,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Threads => Backend::Threads,
            BackendArg::Async => Backend::Async,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Probe a list of candidate paths on a target host.
    Scan {
        /// Base URL of the target, e.g. http://example.com/
        target: String,

        /// Candidate list: one `path[<TAB>description[<TAB>match]]` per line.
        #[arg(long, value_name = "FILE")]
        paths: PathBuf,

        /// Extra directory to fingerprint before testing (repeatable).
        #[arg(long = "dir", value_name = "PATH")]
        dirs: Vec<String>,

        /// Worker threads (threads backend).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Requests in flight per batch (async backend).
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,

        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Do not echo hits as they are found; list them at the end instead.
        #[arg(long)]
        quiet: bool,
    },

    /// Print the not-found fingerprint of a directory on the target.
    Baseline {
        target: String,

        /// Directory to fingerprint.
        #[arg(long, default_value = "/", value_name = "PATH")]
        dir: String,
    },
}

impl Cli {
    /// Configuration with this invocation's flags applied on top.
    pub fn scan_config(&self) -> Result<ScanConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        cfg.debug |= self.debug;
        match &self.command {
            CliCommand::Scan {
                target,
                workers,
                batch_size,
                backend,
                quiet,
                ..
            } => {
                cfg.target_host = target.clone();
                if let Some(n) = workers {
                    cfg.workers = *n;
                }
                if let Some(n) = batch_size {
                    cfg.batch_size = *n;
                }
                if let Some(b) = backend {
                    cfg.backend = (*b).into();
                }
                if *quiet {
                    cfg.display_output = false;
                }
            }
            CliCommand::Baseline { target, .. } => cfg.target_host = target.clone(),
        }
        Ok(cfg)
    }

    pub async fn run(self) -> Result<()> {
        let cfg = self.scan_config()?;
        tracing::debug!("effective config: {:?}", cfg);

        match self.command {
            CliCommand::Scan { paths, dirs, .. } => {
                run_scan(cfg, &paths, dirs).await?;
            }
            CliCommand::Baseline { dir, .. } => run_baseline(&cfg, &dir).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
