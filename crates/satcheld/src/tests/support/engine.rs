//! Engine doubles: record lifecycle calls and support injected failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use satchel_config::Config;

use crate::engine::{Engine, EngineError, EngineProvider};

/// Engine double that records run and shutdown calls and never blocks.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    run_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
}

impl RecordingEngine {
    /// Number of times the run loop was entered.
    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    /// Number of shutdown requests observed.
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

impl Engine for RecordingEngine {
    fn run(&self) -> Result<(), EngineError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) -> Result<(), EngineError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Provider double handing out a shared [`RecordingEngine`].
#[derive(Debug, Default)]
pub struct RecordingEngineProvider {
    engine: Arc<RecordingEngine>,
    provision_calls: AtomicUsize,
}

impl RecordingEngineProvider {
    /// The engine every provision call hands out.
    pub fn engine(&self) -> Arc<RecordingEngine> {
        Arc::clone(&self.engine)
    }

    /// Number of provision requests observed.
    pub fn provision_calls(&self) -> usize {
        self.provision_calls.load(Ordering::SeqCst)
    }
}

impl EngineProvider for RecordingEngineProvider {
    fn provision(&self, _config: &Config) -> Result<Arc<dyn Engine>, EngineError> {
        self.provision_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine())
    }
}

/// Provider double that refuses every provision request.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingEngineProvider;

impl EngineProvider for FailingEngineProvider {
    fn provision(&self, _config: &Config) -> Result<Arc<dyn Engine>, EngineError> {
        Err(EngineError::NoListenEndpoints)
    }
}
