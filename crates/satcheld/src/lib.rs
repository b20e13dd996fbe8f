//! Bootstrap and lifecycle logic for the Satchel daemon.
//!
//! The daemon brings a container engine up in a fixed order: validate and
//! prepare the home directory, start the dependent runtime processes under
//! the [`Supervisor`], wire cleanup into the [`ShutdownCoordinator`], start
//! the termination-signal listener, then provision the serving [`Engine`] and
//! block in its run loop. Teardown mirrors that order and is safe to trigger
//! from any exit path: the coordinator runs its handlers exactly once no
//! matter how many paths race to fire it, and a scoped [`StopGuard`] releases
//! the dependent processes even when bootstrap fails partway.
//!
//! Structured telemetry is initialised before any of this via the
//! [`telemetry`] module, so every stage of the sequence is observable on
//! stderr in either compact or JSON form.

mod bootstrap;
mod engine;
mod shutdown;
mod supervisor;
pub mod telemetry;

pub use bootstrap::{LaunchError, run_daemon};
pub use engine::{CoreEngine, Engine, EngineError, EngineProvider, SystemEngineProvider};
pub use shutdown::{
    SIGNAL_EXIT_CODE, ShutdownCoordinator, ShutdownError, SignalListener, TERMINATION_SIGNALS,
};
pub use supervisor::{
    ProcessLauncher, ProcessSpec, StopFailure, StopGuard, Supervisor, SupervisorError,
    SystemLauncher,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
