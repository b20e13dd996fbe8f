//! Launcher double that spawns for real whilst recording every pid.

use std::io;
use std::process::Child;
use std::sync::{Arc, Mutex};

use crate::supervisor::{ProcessLauncher, ProcessSpec, SystemLauncher};

/// Launcher that delegates to [`SystemLauncher`] and records spawned pids.
///
/// Recording at launch time keeps the pids visible to assertions even after
/// a rollback has already reaped the children.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    inner: SystemLauncher,
    pids: Arc<Mutex<Vec<u32>>>,
}

impl RecordingLauncher {
    /// Pids of every process launched so far, in launch order.
    pub fn pids(&self) -> Vec<u32> {
        self.pids.lock().expect("pid mutex poisoned").clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, spec: &ProcessSpec) -> io::Result<Child> {
        let child = self.inner.launch(spec)?;
        self.pids
            .lock()
            .expect("pid mutex poisoned")
            .push(child.id());
        Ok(child)
    }
}
