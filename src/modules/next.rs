//! # Continuation handed to a module's configuration step.
//!
//! A configuration step finishes in one of two ways:
//!
//! - **Synchronously**: it returns `Ok(())` or `Err(..)` and never touches [`Next`].
//! - **Deferred**: it calls [`Next::defer`], keeps the returned [`Completion`]
//!   (e.g. moves it into a thread or an async task) and returns `Ok(())`. The
//!   orchestrator then blocks the pass until the completion is resolved.
//!
//! ```text
//! configure(next, opts, orch) ──► Ok(())  ── next untouched ──► Ready
//!                              │
//!                              ├─► Ok(())  ── next.defer() ──► block_on(completion)
//!                              │                                 ├─ complete()  ─► Ready
//!                              │                                 ├─ fail(err)   ─► Failed(err)
//!                              │                                 └─ dropped     ─► Failed(Abandoned)
//!                              └─► Err(e) ──────────────────────► Failed(e)
//! ```
//!
//! A completion held forever keeps the pass pending forever.

use futures::channel::oneshot;

use crate::error::ModuleError;

pub(crate) type Outcome = Result<(), ModuleError>;

/// Continuation of one configuration step.
#[derive(Debug)]
pub struct Next {
    tx: oneshot::Sender<Outcome>,
    deferred: oneshot::Sender<()>,
}

/// Orchestrator side of a [`Next`].
#[derive(Debug)]
pub(crate) struct Pending {
    rx: oneshot::Receiver<Outcome>,
    deferred: oneshot::Receiver<()>,
}

impl Next {
    pub(crate) fn channel() -> (Next, Pending) {
        let (tx, rx) = oneshot::channel();
        let (deferred_tx, deferred_rx) = oneshot::channel();
        (
            Next {
                tx,
                deferred: deferred_tx,
            },
            Pending {
                rx,
                deferred: deferred_rx,
            },
        )
    }

    /// Switches the step to deferred completion.
    ///
    /// The pass will not move past this module until the returned handle is resolved.
    pub fn defer(self) -> Completion {
        let _ = self.deferred.send(());
        Completion { tx: Some(self.tx) }
    }
}

impl Pending {
    /// Resolves the step given what the configuration callback returned.
    ///
    /// Blocks the calling thread while a deferred completion is outstanding.
    pub(crate) fn settle(mut self, returned: Outcome) -> Outcome {
        returned?;
        match self.deferred.try_recv() {
            Ok(Some(())) => match futures::executor::block_on(self.rx) {
                Ok(outcome) => outcome,
                Err(oneshot::Canceled) => Err(ModuleError::Abandoned),
            },
            _ => Ok(()),
        }
    }
}

/// Handle resolving a deferred configuration step.
///
/// Resolve it exactly once with [`complete`](Self::complete) or
/// [`fail`](Self::fail). Dropping it unresolved fails the step with
/// [`ModuleError::Abandoned`].
#[derive(Debug)]
pub struct Completion {
    tx: Option<oneshot::Sender<Outcome>>,
}

impl Completion {
    /// Marks the step successful.
    pub fn complete(mut self) {
        self.resolve(Ok(()));
    }

    /// Marks the step failed.
    pub fn fail(mut self, error: ModuleError) {
        self.resolve(Err(error));
    }

    fn resolve(&mut self, outcome: Outcome) {
        if let Some(tx) = self.tx.take() {
            // The receiver is gone only if the pass itself was torn down.
            let _ = tx.send(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn untouched_next_completes_synchronously() {
        let (next, pending) = Next::channel();
        drop(next);
        assert!(pending.settle(Ok(())).is_ok());
    }

    #[test]
    fn returned_error_wins_over_deferral() {
        let (next, pending) = Next::channel();
        let completion = next.defer();
        let outcome = pending.settle(Err(ModuleError::msg("boom")));
        assert_eq!(outcome.unwrap_err().to_string(), "boom");
        completion.complete();
    }

    #[test]
    fn deferred_completion_from_another_thread() {
        let (next, pending) = Next::channel();
        let completion = next.defer();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completion.complete();
        });
        assert!(pending.settle(Ok(())).is_ok());
        worker.join().unwrap();
    }

    #[test]
    fn deferred_failure_is_reported() {
        let (next, pending) = Next::channel();
        next.defer().fail(ModuleError::msg("late failure"));
        let err = pending.settle(Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "late failure");
    }

    #[test]
    fn dropped_completion_is_abandoned() {
        let (next, pending) = Next::channel();
        drop(next.defer());
        let err = pending.settle(Ok(())).unwrap_err();
        assert_eq!(err.as_label(), "module_abandoned");
    }
}
