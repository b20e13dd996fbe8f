//! Error surface for process supervision.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while starting or stopping supervised processes.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// `start_all` was called while children were already tracked.
    #[error("supervised processes are already running")]
    AlreadyStarted,
    /// A dependent process failed to launch.
    #[error("failed to launch '{name}' ({program}): {source}")]
    Spawn {
        /// Short name of the process that failed to launch.
        name: String,
        /// Executable that failed to launch.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// One or more children could not be confirmed stopped.
    #[error("failed to stop {} supervised process(es)", .failures.len())]
    Stop {
        /// Per-child stop failures, in stop order.
        failures: Vec<StopFailure>,
    },
}

/// A single child that could not be stopped cleanly.
#[derive(Debug, Error)]
#[error("'{name}' (pid {pid}): {source}")]
pub struct StopFailure {
    /// Short name of the child process.
    pub name: String,
    /// Process id of the child.
    pub pid: u32,
    /// Underlying OS error.
    #[source]
    pub source: io::Error,
}
