//! Append-only handler registry with a single-shot shutdown pass.

use std::error::Error;
use std::fmt;
use std::mem;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use super::SHUTDOWN_TARGET;

type Handler = Box<dyn FnOnce() -> Result<(), Box<dyn Error + Send + Sync>> + Send>;

struct Registered {
    label: &'static str,
    handler: Handler,
}

/// Coordinates cleanup work across every exit path.
///
/// Handlers are appended during bootstrap and run in registration order by
/// the first call to [`run_all`](Self::run_all). Whichever exit path fires
/// first performs the pass; every later or concurrent trigger observes the
/// pass as already performed and does nothing. A handler that fails is
/// logged and skipped, never aborting the rest of the pass.
#[derive(Default)]
pub struct ShutdownCoordinator {
    handlers: Mutex<Vec<Registered>>,
    fired: OnceCell<()>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator with no registered handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cleanup handler to the registry.
    ///
    /// Handlers run in the order they were registered. Registering after the
    /// shutdown pass has run is tolerated but the handler will never be
    /// invoked.
    pub fn register<F, E>(&self, label: &'static str, handler: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        if self.has_fired() {
            warn!(
                target: SHUTDOWN_TARGET,
                label,
                "handler registered after the shutdown pass, it will never run"
            );
            return;
        }
        self.lock_handlers().push(Registered {
            label,
            handler: Box::new(move || handler().map_err(Into::into)),
        });
    }

    /// Runs every registered handler exactly once across all callers.
    ///
    /// Returns `true` when this call performed the pass. Concurrent callers
    /// block until the winning pass completes and then return `false`.
    pub fn run_all(&self) -> bool {
        let mut performed = false;
        self.fired.get_or_init(|| {
            performed = true;
            self.run_handlers();
        });
        if !performed {
            debug!(target: SHUTDOWN_TARGET, "shutdown pass already performed");
        }
        performed
    }

    /// Whether the shutdown pass has already completed.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.get().is_some()
    }

    fn run_handlers(&self) {
        let handlers = {
            let mut registered = self.lock_handlers();
            mem::take(&mut *registered)
        };
        info!(
            target: SHUTDOWN_TARGET,
            handlers = handlers.len(),
            "running shutdown handlers"
        );
        for entry in handlers {
            debug!(target: SHUTDOWN_TARGET, label = entry.label, "running shutdown handler");
            if let Err(error) = (entry.handler)() {
                warn!(
                    target: SHUTDOWN_TARGET,
                    label = entry.label,
                    error = %error,
                    "shutdown handler failed, continuing with remaining handlers"
                );
            }
        }
    }

    fn lock_handlers(&self) -> MutexGuard<'_, Vec<Registered>> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("pending", &self.lock_handlers().len())
            .field("fired", &self.has_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    use super::*;

    fn recording_handler(
        order: &Arc<Mutex<Vec<&'static str>>>,
        label: &'static str,
    ) -> impl FnOnce() -> Result<(), io::Error> + Send + 'static {
        let order = Arc::clone(order);
        move || {
            order
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(label);
            Ok(())
        }
    }

    #[test]
    fn runs_handlers_in_registration_order() {
        let coordinator = ShutdownCoordinator::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        coordinator.register("first", recording_handler(&order, "first"));
        coordinator.register("second", recording_handler(&order, "second"));
        coordinator.register("third", recording_handler(&order, "third"));

        assert!(coordinator.run_all());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn handler_failure_does_not_block_later_handlers() {
        let coordinator = ShutdownCoordinator::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        coordinator.register("refusing", || {
            Err::<(), io::Error>(io::Error::other("refusing to stop"))
        });
        coordinator.register("after", recording_handler(&order, "after"));

        assert!(coordinator.run_all());
        assert_eq!(*order.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let coordinator = ShutdownCoordinator::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        coordinator.register("count", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), io::Error>(())
        });

        assert!(coordinator.run_all());
        assert!(!coordinator.run_all());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_passes_fire_exactly_once() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        coordinator.register("count", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), io::Error>(())
        });

        let contenders = 4;
        let barrier = Arc::new(Barrier::new(contenders));
        let winners = Arc::new(AtomicUsize::new(0));
        let threads: Vec<_> = (0..contenders)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    barrier.wait();
                    if coordinator.run_all() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().expect("contender thread panicked");
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registration_after_the_pass_never_runs() {
        let coordinator = ShutdownCoordinator::new();
        assert!(coordinator.run_all());

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        coordinator.register("late", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), io::Error>(())
        });

        assert!(!coordinator.run_all());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_labels_are_kept_and_both_run() {
        let coordinator = ShutdownCoordinator::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        coordinator.register("engine", recording_handler(&order, "engine-a"));
        coordinator.register("engine", recording_handler(&order, "engine-b"));

        assert!(coordinator.run_all());
        assert_eq!(*order.lock().unwrap(), vec!["engine-a", "engine-b"]);
    }
}
