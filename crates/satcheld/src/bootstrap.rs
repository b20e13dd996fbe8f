//! Daemon bootstrap sequencing.
//!
//! Bootstrap moves through a fixed order: validate the home directory,
//! start the dependent processes, wire the shutdown coordinator and signal
//! listener, provision the engine, then block in the serving loop. Failure
//! at any stage surfaces a [`LaunchError`] and leaves nothing from that
//! launch running: a scoped [`StopGuard`] releases the dependent processes
//! on every exit path.

use std::ffi::OsString;
use std::fs::{self, DirBuilder};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use satchel_config::Config;

use crate::engine::{EngineError, EngineProvider, SystemEngineProvider};
use crate::shutdown::{ShutdownCoordinator, ShutdownError, SignalListener};
use crate::supervisor::{ProcessLauncher, ProcessSpec, StopGuard, Supervisor, SupervisorError};

pub(crate) const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Mode applied when the daemon home directory is created.
#[cfg(unix)]
const HOME_DIR_MODE: u32 = 0o700;

/// Errors surfaced while launching or running the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The configured home directory was empty.
    #[error("daemon home directory must not be empty")]
    HomeDirEmpty,
    /// The configured home directory was not an absolute path.
    #[error("daemon home directory '{path}' must be an absolute path")]
    HomeDirNotAbsolute {
        /// Configured home directory.
        path: PathBuf,
    },
    /// The configured home directory exists but is not a directory.
    #[error("daemon home directory '{path}' is not a directory")]
    HomeDirNotDirectory {
        /// Configured home directory.
        path: PathBuf,
    },
    /// Inspecting the home directory failed.
    #[error("failed to inspect daemon home directory '{path}': {source}")]
    HomeDirInspect {
        /// Configured home directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Creating the home directory failed.
    #[error("failed to create daemon home directory '{path}': {source}")]
    HomeDirCreate {
        /// Configured home directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Starting the dependent processes failed.
    #[error("failed to start dependent processes: {source}")]
    Dependencies {
        /// Underlying supervisor error.
        #[source]
        source: SupervisorError,
    },
    /// Installing the termination-signal listener failed.
    #[error("failed to start signal listener: {source}")]
    Signals {
        /// Underlying listener error.
        #[source]
        source: ShutdownError,
    },
    /// Provisioning or running the engine failed.
    #[error("engine failure: {source}")]
    Engine {
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
}

impl From<SupervisorError> for LaunchError {
    fn from(source: SupervisorError) -> Self {
        Self::Dependencies { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Signals { source }
    }
}

impl From<EngineError> for LaunchError {
    fn from(source: EngineError) -> Self {
        Self::Engine { source }
    }
}

/// Collaborators injected into the daemon launch sequence.
pub(crate) struct LaunchPlan<'a> {
    /// Provider consulted for the serving engine.
    pub(crate) provider: &'a dyn EngineProvider,
    /// Launcher used for the dependent processes.
    pub(crate) launcher: Box<dyn ProcessLauncher>,
}

impl Default for LaunchPlan<'static> {
    fn default() -> Self {
        Self {
            provider: &SystemEngineProvider,
            launcher: Box::new(crate::supervisor::SystemLauncher),
        }
    }
}

/// Runs the daemon using the production collaborators.
pub fn run_daemon(config: &Config) -> Result<(), LaunchError> {
    run_daemon_with(config, LaunchPlan::default())
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with(config: &Config, plan: LaunchPlan<'_>) -> Result<(), LaunchError> {
    let LaunchPlan { provider, launcher } = plan;

    info!(
        target: BOOTSTRAP_TARGET,
        home_dir = %config.home_dir.display(),
        endpoints = config.listen.len(),
        "starting daemon runtime"
    );
    prepare_home_dir(&config.home_dir)?;
    clear_stale_runtime_socket(&config.runtime_addr);

    let supervisor = Arc::new(Supervisor::with_launcher(
        launcher,
        vec![runtime_backend_spec(config)],
    ));
    let _stop_guard = StopGuard::new(Arc::clone(&supervisor));
    supervisor.start_all()?;

    let coordinator = Arc::new(ShutdownCoordinator::new());
    let supervised = Arc::clone(&supervisor);
    coordinator.register("supervised processes", move || supervised.stop_all());
    let listener = SignalListener::spawn(Arc::clone(&coordinator))?;

    let engine = provider.provision(config)?;
    let serving = Arc::clone(&engine);
    coordinator.register("engine", move || serving.shutdown());

    info!(target: BOOTSTRAP_TARGET, "daemon running");
    let outcome = engine.run();

    if !coordinator.run_all() {
        // The signal path performed the pass and is already exiting the
        // process; parking keeps this thread from racing it to a clean exit
        // status.
        debug!(
            target: BOOTSTRAP_TARGET,
            "shutdown pass performed by the signal path, awaiting process exit"
        );
        loop {
            thread::park();
        }
    }
    if let Err(error) = listener.close() {
        warn!(
            target: BOOTSTRAP_TARGET,
            error = %error,
            "failed to stop signal listener"
        );
    }
    info!(target: BOOTSTRAP_TARGET, "shutdown sequence completed");
    Ok(outcome?)
}

/// Validates the daemon home directory, creating it when absent.
pub(crate) fn prepare_home_dir(path: &Path) -> Result<(), LaunchError> {
    if path.as_os_str().is_empty() {
        return Err(LaunchError::HomeDirEmpty);
    }
    if !path.is_absolute() {
        return Err(LaunchError::HomeDirNotAbsolute {
            path: path.to_path_buf(),
        });
    }
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(LaunchError::HomeDirNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == io::ErrorKind::NotFound => create_home_dir(path),
        Err(source) => Err(LaunchError::HomeDirInspect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn create_home_dir(path: &Path) -> Result<(), LaunchError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(HOME_DIR_MODE);
    }
    builder
        .create(path)
        .map_err(|source| LaunchError::HomeDirCreate {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        target: BOOTSTRAP_TARGET,
        path = %path.display(),
        "created daemon home directory"
    );
    Ok(())
}

/// Removes a runtime socket left behind by a previous run.
///
/// Absence is the common case and stays silent; any other removal failure is
/// logged and left for the runtime backend to surface when it binds.
pub(crate) fn clear_stale_runtime_socket(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!(
            target: BOOTSTRAP_TARGET,
            path = %path.display(),
            "removed stale runtime socket"
        ),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!(
            target: BOOTSTRAP_TARGET,
            path = %path.display(),
            error = %error,
            "failed to remove stale runtime socket"
        ),
    }
}

/// Builds the launch spec for the container runtime backend.
pub(crate) fn runtime_backend_spec(config: &Config) -> ProcessSpec {
    ProcessSpec::new(
        &config.runtime_path,
        [
            OsString::from("--config"),
            config.runtime_config.clone().into_os_string(),
            OsString::from("--address"),
            config.runtime_addr.clone().into_os_string(),
            OsString::from("--root"),
            config.home_dir.join("runtime/root").into_os_string(),
            OsString::from("--state"),
            config.home_dir.join("runtime/state").into_os_string(),
            OsString::from("--log-level"),
            OsString::from(config.log_level()),
        ],
    )
}
