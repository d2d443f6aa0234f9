//! Tracing subscriber setup
//!
//! `DEVINSIGHT_LOG` takes an `EnvFilter` directive (default `warn`); `-v`
//! forces `debug`. The dashboard owns the terminal, so it logs to a file or
//! not at all.

use anyhow::Context;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DEVINSIGHT_LOG";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

impl LogTarget {
    /// Pick a target; `owns_terminal` is true when a full-screen UI will run
    pub fn choose(log_file: Option<PathBuf>, owns_terminal: bool) -> Self {
        match log_file {
            Some(path) => LogTarget::File(path),
            None if owns_terminal => LogTarget::Off,
            None => LogTarget::Stderr,
        }
    }
}

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber
pub fn init(verbose: bool, target: &LogTarget) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false);

    let installed = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file: {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))
}
