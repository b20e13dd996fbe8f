//! Test harness utilities for the daemon lifecycle suites.

mod engine;
mod launcher;
mod runtime;

pub use engine::{FailingEngineProvider, RecordingEngineProvider};
pub use launcher::RecordingLauncher;
pub use runtime::{process_alive, wait_for, write_blocking_script, write_script};
