//! Atomic start and idempotent stop across the supervised process set.

use std::io;
use std::process::Child;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use super::errors::{StopFailure, SupervisorError};
use super::launcher::{ProcessLauncher, SystemLauncher};
use super::spec::ProcessSpec;
use super::{STOP_GRACE, STOP_POLL_INTERVAL, SUPERVISOR_TARGET};

/// Supervisor owning the dependent-process set.
///
/// The child table is mutex-guarded so the normal exit path, the registered
/// shutdown handler, and the scoped [`StopGuard`] can all call
/// [`stop_all`](Self::stop_all) without coordination: the first effective
/// call drains the table and performs the teardown, later calls observe an
/// empty table and return immediately.
#[derive(Debug)]
pub struct Supervisor {
    launcher: Box<dyn ProcessLauncher>,
    specs: Vec<ProcessSpec>,
    stop_grace: Duration,
    children: Mutex<Vec<SupervisedChild>>,
}

#[derive(Debug)]
struct SupervisedChild {
    name: String,
    child: Child,
}

impl Supervisor {
    /// Builds a supervisor over the given specs without starting anything.
    #[must_use]
    pub fn new(specs: Vec<ProcessSpec>) -> Self {
        Self::with_launcher(Box::new(SystemLauncher), specs)
    }

    /// Builds a supervisor that spawns through the given launcher.
    #[must_use]
    pub fn with_launcher(launcher: Box<dyn ProcessLauncher>, specs: Vec<ProcessSpec>) -> Self {
        Self {
            launcher,
            specs,
            stop_grace: STOP_GRACE,
            children: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the grace period allowed before a child is killed outright.
    #[must_use]
    pub fn with_stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    /// Specs this supervisor launches, in declaration order.
    #[must_use]
    pub fn specs(&self) -> &[ProcessSpec] {
        &self.specs
    }

    /// Launches every spec in declaration order.
    ///
    /// On any launch failure the children already started are stopped again,
    /// in reverse launch order, before the error is returned; rollback
    /// failures are logged and never mask the original error. After an error
    /// return no child from this call remains running.
    pub fn start_all(&self) -> Result<(), SupervisorError> {
        let mut children = self.lock_children();
        if !children.is_empty() {
            return Err(SupervisorError::AlreadyStarted);
        }
        for spec in &self.specs {
            match self.launcher.launch(spec) {
                Ok(child) => {
                    info!(
                        target: SUPERVISOR_TARGET,
                        name = %spec.display_name(),
                        pid = child.id(),
                        "dependent process started"
                    );
                    children.push(SupervisedChild {
                        name: spec.display_name(),
                        child,
                    });
                }
                Err(source) => {
                    warn!(
                        target: SUPERVISOR_TARGET,
                        name = %spec.display_name(),
                        error = %source,
                        started = children.len(),
                        "launch failed, rolling back started processes"
                    );
                    self.roll_back(&mut children);
                    return Err(SupervisorError::Spawn {
                        name: spec.display_name(),
                        program: spec.program().to_path_buf(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// Stops every currently-tracked child.
    ///
    /// Idempotent: once a call has drained the child table, later calls are
    /// no-ops. An individual stop failure never aborts the pass; failures are
    /// aggregated into the returned error after every child has been
    /// attempted.
    pub fn stop_all(&self) -> Result<(), SupervisorError> {
        let drained: Vec<SupervisedChild> = {
            let mut children = self.lock_children();
            children.drain(..).collect()
        };
        if drained.is_empty() {
            debug!(target: SUPERVISOR_TARGET, "no supervised processes to stop");
            return Ok(());
        }

        let mut failures = Vec::new();
        for mut entry in drained {
            let pid = entry.child.id();
            match stop_child(&mut entry.child, self.stop_grace) {
                Ok(()) => info!(
                    target: SUPERVISOR_TARGET,
                    name = %entry.name,
                    pid,
                    "dependent process stopped"
                ),
                Err(source) => {
                    warn!(
                        target: SUPERVISOR_TARGET,
                        name = %entry.name,
                        pid,
                        error = %source,
                        "failed to stop dependent process"
                    );
                    failures.push(StopFailure {
                        name: entry.name,
                        pid,
                        source,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SupervisorError::Stop { failures })
        }
    }

    /// Number of children currently tracked as live.
    #[must_use]
    pub fn live_children(&self) -> usize {
        self.lock_children().len()
    }

    fn roll_back(&self, children: &mut Vec<SupervisedChild>) {
        while let Some(mut entry) = children.pop() {
            let pid = entry.child.id();
            if let Err(error) = stop_child(&mut entry.child, self.stop_grace) {
                warn!(
                    target: SUPERVISOR_TARGET,
                    name = %entry.name,
                    pid,
                    error = %error,
                    "rollback failed to stop process"
                );
            } else {
                info!(
                    target: SUPERVISOR_TARGET,
                    name = %entry.name,
                    pid,
                    "rolled back process"
                );
            }
        }
    }

    fn lock_children(&self) -> MutexGuard<'_, Vec<SupervisedChild>> {
        self.children
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Scoped release for the supervised process set.
///
/// Dropping the guard stops every tracked child, so the dependent processes
/// are torn down on every exit path even when no shutdown pass ran. Stop
/// failures are logged; idempotent [`Supervisor::stop_all`] keeps the drop
/// safe after an earlier teardown.
#[derive(Debug)]
pub struct StopGuard {
    supervisor: Arc<Supervisor>,
}

impl StopGuard {
    /// Arms a guard over the supervisor.
    #[must_use]
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        if let Err(error) = self.supervisor.stop_all() {
            warn!(
                target: SUPERVISOR_TARGET,
                error = %error,
                "scoped stop failed for supervised processes"
            );
        }
    }
}

/// Stops one child: polite termination request, bounded wait, then kill.
fn stop_child(child: &mut Child, stop_grace: Duration) -> Result<(), io::Error> {
    if let Ok(Some(status)) = child.try_wait() {
        debug!(target: SUPERVISOR_TARGET, ?status, "process had already exited");
        return Ok(());
    }

    request_termination(child)?;
    let deadline = Instant::now() + stop_grace;
    loop {
        if let Some(status) = child.try_wait()? {
            debug!(
                target: SUPERVISOR_TARGET,
                ?status,
                "process exited after termination request"
            );
            return Ok(());
        }
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(STOP_POLL_INTERVAL);
    }

    warn!(
        target: SUPERVISOR_TARGET,
        pid = child.id(),
        "process ignored termination request, killing"
    );
    child.kill()?;
    child.wait()?;
    Ok(())
}

fn request_termination(child: &Child) -> Result<(), io::Error> {
    let pid = Pid::from_raw(child.id() as i32);
    kill(pid, Signal::SIGTERM).map_err(|errno| io::Error::from_raw_os_error(errno as i32))
}
