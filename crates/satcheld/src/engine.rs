//! Core serving engine provisioned once bootstrap completes.
//!
//! The daemon does not construct its serving loop directly; it asks an
//! [`EngineProvider`] for one after validation and dependency startup have
//! succeeded. That seam keeps bootstrap testable with recording doubles and
//! lets the production engine grow independently of the lifecycle code.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info};

use satchel_config::{Config, ListenEndpoint};

pub(crate) const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

/// Errors surfaced when provisioning or running the serving engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration named no listen endpoints to serve on.
    #[error("no listen endpoints configured")]
    NoListenEndpoints,
    /// The engine was asked to run while already running.
    #[error("engine is already running")]
    AlreadyRunning,
}

/// Serving loop run by the daemon once its dependencies are up.
pub trait Engine: Send + Sync {
    /// Blocks serving requests until shutdown is requested.
    fn run(&self) -> Result<(), EngineError>;

    /// Asks the engine to stop serving. Idempotent.
    fn shutdown(&self) -> Result<(), EngineError>;
}

/// Builds the engine behind a resolved configuration.
pub trait EngineProvider {
    /// Validates the configuration and provisions its engine.
    fn provision(&self, config: &Config) -> Result<Arc<dyn Engine>, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Running,
    Stopped,
}

/// Engine that parks the serving thread until shutdown is requested.
///
/// Request dispatch over the configured endpoints is layered on separately;
/// this type owns the lifecycle contract the daemon relies on: `run` blocks
/// exactly while the engine is live and returns once `shutdown` is called,
/// including when the shutdown request arrived before `run` did.
#[derive(Debug)]
pub struct CoreEngine {
    listen: Vec<ListenEndpoint>,
    state: Mutex<EngineState>,
    stopped: Condvar,
}

impl CoreEngine {
    /// Builds an idle engine over the given listen endpoints.
    #[must_use]
    pub fn new(listen: Vec<ListenEndpoint>) -> Self {
        Self {
            listen,
            state: Mutex::new(EngineState::Idle),
            stopped: Condvar::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn state(&self) -> EngineState {
        *self.lock_state()
    }
}

impl Engine for CoreEngine {
    fn run(&self) -> Result<(), EngineError> {
        let mut state = self.lock_state();
        match *state {
            EngineState::Stopped => {
                debug!(
                    target: ENGINE_TARGET,
                    "shutdown requested before the engine ran, returning"
                );
                return Ok(());
            }
            EngineState::Running => return Err(EngineError::AlreadyRunning),
            EngineState::Idle => *state = EngineState::Running,
        }
        for endpoint in &self.listen {
            info!(target: ENGINE_TARGET, endpoint = %endpoint, "serving on endpoint");
        }
        while *state != EngineState::Stopped {
            state = self
                .stopped
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        debug!(target: ENGINE_TARGET, "engine run loop finished");
        Ok(())
    }

    fn shutdown(&self) -> Result<(), EngineError> {
        let mut state = self.lock_state();
        if *state == EngineState::Stopped {
            debug!(target: ENGINE_TARGET, "engine shutdown already requested");
            return Ok(());
        }
        *state = EngineState::Stopped;
        self.stopped.notify_all();
        info!(target: ENGINE_TARGET, "engine shutdown requested");
        Ok(())
    }
}

/// Provider that provisions the in-process [`CoreEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEngineProvider;

impl EngineProvider for SystemEngineProvider {
    fn provision(&self, config: &Config) -> Result<Arc<dyn Engine>, EngineError> {
        if config.listen.is_empty() {
            return Err(EngineError::NoListenEndpoints);
        }
        Ok(Arc::new(CoreEngine::new(config.listen.clone())))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    fn wait_until(probe: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !probe() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn run_returns_immediately_once_stopped() {
        let engine = CoreEngine::new(vec![ListenEndpoint::unix("/tmp/satchel-test.sock")]);
        engine.shutdown().expect("shutdown should succeed");
        engine.run().expect("stopped engine should return at once");
    }

    #[test]
    fn shutdown_unblocks_a_running_engine() {
        let engine = Arc::new(CoreEngine::new(vec![ListenEndpoint::unix(
            "/tmp/satchel-test.sock",
        )]));
        let runner = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.run())
        };
        wait_until(|| engine.state() == EngineState::Running);

        engine.shutdown().expect("shutdown should succeed");
        runner
            .join()
            .expect("runner thread panicked")
            .expect("run should finish cleanly");
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn second_run_reports_already_running() {
        let engine = Arc::new(CoreEngine::new(vec![ListenEndpoint::unix(
            "/tmp/satchel-test.sock",
        )]));
        let runner = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.run())
        };
        wait_until(|| engine.state() == EngineState::Running);

        assert!(matches!(engine.run(), Err(EngineError::AlreadyRunning)));

        engine.shutdown().expect("shutdown should succeed");
        runner
            .join()
            .expect("runner thread panicked")
            .expect("run should finish cleanly");
    }

    #[test]
    fn shutdown_is_idempotent() {
        let engine = CoreEngine::new(vec![ListenEndpoint::unix("/tmp/satchel-test.sock")]);
        engine.shutdown().expect("shutdown should succeed");
        engine.shutdown().expect("second shutdown should succeed");
        engine.run().expect("stopped engine should return at once");
    }

    #[test]
    fn provider_rejects_empty_listen_list() {
        let config = Config {
            listen: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(
            SystemEngineProvider.provision(&config),
            Err(EngineError::NoListenEndpoints)
        ));
    }

    #[test]
    fn provider_builds_engine_for_default_config() {
        let config = Config::default();
        SystemEngineProvider
            .provision(&config)
            .expect("default config should provision an engine");
    }
}
