//! Error types for signal-listener installation and teardown.

use std::io;

use thiserror::Error;

/// Failures raised while installing or tearing down the signal listener.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering the signal set with the runtime failed.
    #[error("failed to install termination signal handlers: {source}")]
    Install {
        /// Underlying registration failure.
        #[source]
        source: io::Error,
    },
    /// The listener thread panicked before it could be joined.
    #[error("signal listener thread panicked")]
    ListenerPanic,
}
