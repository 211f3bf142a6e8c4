//! [`TestContext`] adapter for plain `#[test]` functions.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
};

use log::error;

use super::{Cleanup, SkipSignal, TestContext};
use crate::panic::format_panic;

/// Hosts a test body and provides the [`TestContext`] capabilities to it.
///
/// Rust's test runner has no cleanup or skip hooks, so [`Harness::run`]
/// supplies them: it runs the body, then every registered cleanup in reverse
/// registration order, then reports the outcome.
///
/// - A hard failure unwinds the body; the panic is re-raised once cleanups
///   have run.
/// - Soft failures are collected and fail the test after cleanup.
/// - A skip ends the body early and the test passes.
///
/// Failures reported from other threads (for example by the mock HTTP
/// server's listener) are recorded and fail the test the same way.
///
/// ```
/// use testkit::{Harness, TestContext};
///
/// Harness::run(|t| {
///     t.cleanup(Box::new(|| println!("cleaned up")));
/// });
/// ```
#[derive(Clone, Default)]
pub struct Harness {
    state: Arc<Mutex<HarnessState>>,
}

#[derive(Default)]
struct HarnessState {
    cleanups: Vec<Cleanup>,
    errors: Vec<String>,
    fatal: Option<String>,
    skipped: Option<String>,
}

impl Harness {
    /// Run `body` with a fresh harness, then clean up and report.
    ///
    /// # Panics
    ///
    /// Panics when the body or a cleanup failed, hard or soft.
    pub fn run<F>(body: F)
    where
        F: FnOnce(&Harness),
    {
        let harness = Harness::default();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&harness)));
        harness.run_cleanups();
        harness.report(outcome);
    }

    /// Whether any failure, hard or soft, has been recorded so far.
    #[must_use]
    pub fn failed(&self) -> bool {
        let state = self.lock();
        state.fatal.is_some() || !state.errors.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HarnessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_cleanups(&self) {
        loop {
            // Release the lock before running: cleanups may report failures.
            let Some(cleanup) = self.lock().cleanups.pop() else {
                break;
            };
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(cleanup)) {
                if panic.is::<SkipSignal>() {
                    continue;
                }
                let message = format_panic(panic).to_string();
                let mut state = self.lock();
                if state.fatal.is_none() {
                    state.fatal = Some(message);
                }
            }
        }
    }

    fn report(&self, outcome: thread::Result<()>) {
        let (errors, fatal, skipped) = {
            let mut state = self.lock();
            (
                std::mem::take(&mut state.errors),
                state.fatal.take(),
                state.skipped.take(),
            )
        };

        for message in &errors {
            error!("test failure: message={message}");
        }

        match outcome {
            Err(panic) if !panic.is::<SkipSignal>() => panic::resume_unwind(panic),
            _ => {}
        }
        if let Some(message) = fatal {
            panic!("{message}");
        }
        if !errors.is_empty() {
            panic!("{}", errors.join("\n"));
        }
        if let Some(reason) = skipped {
            tracing::info!(%reason, "test skipped");
        }
    }
}

impl TestContext for Harness {
    fn cleanup(&self, cleanup: Cleanup) { self.lock().cleanups.push(cleanup); }

    fn error(&self, message: &str) { self.lock().errors.push(message.to_owned()); }

    #[track_caller]
    fn fatal(&self, message: &str) -> ! {
        {
            let mut state = self.lock();
            if state.fatal.is_none() {
                state.fatal = Some(message.to_owned());
            }
        }
        panic!("{message}");
    }

    fn skip(&self, reason: &str) -> ! {
        self.lock().skipped = Some(reason.to_owned());
        panic::resume_unwind(Box::new(SkipSignal(reason.to_owned())))
    }
}
