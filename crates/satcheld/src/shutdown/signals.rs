//! Background listener translating termination signals into a shutdown pass.

use std::fmt;
use std::process;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use signal_hook::iterator::backend::Handle;
use tracing::{debug, info, warn};

use super::SHUTDOWN_TARGET;
use super::coordinator::ShutdownCoordinator;
use super::errors::ShutdownError;

/// Signals that trigger coordinated daemon shutdown.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Exit code reported when a termination signal ends the daemon.
pub const SIGNAL_EXIT_CODE: i32 = 1;

/// Listener thread that turns the first termination signal into the
/// shutdown pass and a non-zero process exit.
///
/// Signals delivered while the pass is running are left unread; repeated
/// signals never run the handlers twice. Dropping the listener closes the
/// signal stream and joins the thread, so a normal exit does not leave a
/// detached thread behind.
pub struct SignalListener {
    stream: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalListener {
    /// Installs the termination-signal set and starts the listener thread.
    pub fn spawn(coordinator: Arc<ShutdownCoordinator>) -> Result<Self, ShutdownError> {
        let mut signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let stream = signals.handle();
        let thread = thread::Builder::new()
            .name("satcheld-signals".to_string())
            .spawn(move || listen(&mut signals, &coordinator))
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            stream,
            thread: Some(thread),
        })
    }

    /// Closes the signal stream and joins the listener thread.
    pub fn close(mut self) -> Result<(), ShutdownError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ShutdownError> {
        self.stream.close();
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| ShutdownError::ListenerPanic)?;
        }
        Ok(())
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            warn!(
                target: SHUTDOWN_TARGET,
                error = %error,
                "failed to stop signal listener"
            );
        }
    }
}

impl fmt::Debug for SignalListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalListener")
            .field(
                "thread",
                &self.thread.as_ref().map_or("joined", |_| "listening"),
            )
            .finish()
    }
}

fn listen(signals: &mut Signals, coordinator: &ShutdownCoordinator) {
    let Some(signal) = signals.forever().next() else {
        debug!(
            target: SHUTDOWN_TARGET,
            "signal stream closed before a termination signal arrived"
        );
        return;
    };
    info!(
        target: SHUTDOWN_TARGET,
        signal,
        "termination signal received, shutting down"
    );
    coordinator.run_all();
    process::exit(SIGNAL_EXIT_CODE);
}
