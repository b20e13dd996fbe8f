//! Launch primitive the supervisor drives.

use std::fmt;
use std::io;
use std::process::{Child, Command};

use super::spec::ProcessSpec;

/// Spawns the OS process described by a [`ProcessSpec`].
///
/// The supervisor only needs a spawn seam; termination goes through the
/// returned [`Child`] handle directly.
pub trait ProcessLauncher: fmt::Debug + Send + Sync {
    /// Launches the process, returning its handle.
    fn launch(&self, spec: &ProcessSpec) -> io::Result<Child>;
}

/// Launcher backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, spec: &ProcessSpec) -> io::Result<Child> {
        Command::new(spec.program()).args(spec.args()).spawn()
    }
}
