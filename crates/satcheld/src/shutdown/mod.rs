//! Ordered shutdown coordination and termination-signal handling.
//!
//! Cleanup work registers with the [`ShutdownCoordinator`] during bootstrap;
//! a single pass later runs every handler in registration order, exactly
//! once, regardless of how many exit paths race to trigger it. The
//! [`SignalListener`] feeds that pass from a background thread watching the
//! conventional termination signals.

mod coordinator;
mod errors;
mod signals;

pub use coordinator::ShutdownCoordinator;
pub use errors::ShutdownError;
pub use signals::{SIGNAL_EXIT_CODE, SignalListener, TERMINATION_SIGNALS};

/// Tracing target for shutdown coordination events.
pub(crate) const SHUTDOWN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shutdown");
