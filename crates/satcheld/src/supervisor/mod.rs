//! Supervision of the daemon's dependent processes.
//!
//! The supervisor owns the declarative list of processes the daemon depends
//! on and the children spawned from it. Startup is atomic: when any launch
//! fails, the children already started are stopped again before the error is
//! returned, so callers never observe a partially-started set. Teardown is
//! idempotent and fault tolerant, which lets the same
//! [`Supervisor::stop_all`] serve the registered shutdown handler and the
//! scoped [`StopGuard`] safety net.
//!
//! Children inherit the daemon's standard streams.

use std::time::Duration;

mod errors;
mod launcher;
mod set;
mod spec;

pub use errors::{StopFailure, SupervisorError};
pub use launcher::{ProcessLauncher, SystemLauncher};
pub use set::{StopGuard, Supervisor};
pub use spec::ProcessSpec;

pub(crate) const SUPERVISOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::supervisor");

/// Grace period between the polite termination request and the forced kill.
pub(crate) const STOP_GRACE: Duration = Duration::from_secs(10);

/// Poll interval while waiting for a child to honour a termination request.
pub(crate) const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);
