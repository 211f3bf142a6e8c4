//! A [`TestContext`] double that records every capability call.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{Cleanup, FatalSignal, SkipSignal, TestContext};

/// Records failures, skips and cleanups instead of acting on the test.
///
/// Hard failures and skips still have to stop the caller, so they unwind
/// with a [`FatalSignal`] or [`SkipSignal`] payload. Wrap calls that may
/// fail in [`RecordingContext::catch`] to observe them. Cleanups are stored
/// until [`RecordingContext::run_cleanups`] is called.
///
/// Clones share the same record.
///
/// ```
/// use testkit::{RecordingContext, TestContext};
///
/// let ctx = RecordingContext::new();
/// assert!(ctx.catch(|| ctx.fatal("boom")).is_none());
/// assert_eq!(ctx.fatals(), vec!["boom".to_owned()]);
/// ```
#[derive(Clone, Default)]
pub struct RecordingContext {
    record: Arc<Mutex<Record>>,
}

#[derive(Default)]
struct Record {
    cleanups: Vec<Cleanup>,
    errors: Vec<String>,
    fatals: Vec<String>,
    skips: Vec<String>,
}

impl RecordingContext {
    /// Create an empty recording context.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Soft failures recorded so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> { self.lock().errors.clone() }

    /// Hard failures recorded so far.
    #[must_use]
    pub fn fatals(&self) -> Vec<String> { self.lock().fatals.clone() }

    /// Skip reasons recorded so far.
    #[must_use]
    pub fn skips(&self) -> Vec<String> { self.lock().skips.clone() }

    /// Number of cleanups waiting to run.
    #[must_use]
    pub fn cleanup_count(&self) -> usize { self.lock().cleanups.len() }

    /// Run and discard all registered cleanups, most recent first.
    ///
    /// Hard failures raised by a cleanup are recorded and do not stop the
    /// remaining cleanups.
    pub fn run_cleanups(&self) {
        loop {
            let Some(cleanup) = self.lock().cleanups.pop() else {
                break;
            };
            self.catch(cleanup);
        }
    }

    /// Run `f`, absorbing an unwind raised by this context.
    ///
    /// Returns `None` when `f` failed hard or skipped. Any other panic is
    /// propagated.
    pub fn catch<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(panic) if panic.is::<FatalSignal>() || panic.is::<SkipSignal>() => None,
            Err(panic) => panic::resume_unwind(panic),
        }
    }
}

impl TestContext for RecordingContext {
    fn cleanup(&self, cleanup: Cleanup) { self.lock().cleanups.push(cleanup); }

    fn error(&self, message: &str) { self.lock().errors.push(message.to_owned()); }

    fn fatal(&self, message: &str) -> ! {
        self.lock().fatals.push(message.to_owned());
        panic::resume_unwind(Box::new(FatalSignal(message.to_owned())))
    }

    fn skip(&self, reason: &str) -> ! {
        self.lock().skips.push(reason.to_owned());
        panic::resume_unwind(Box::new(SkipSignal(reason.to_owned())))
    }
}
