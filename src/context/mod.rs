//! Test lifecycle capabilities consumed by every fail-fast helper.
//!
//! Helpers in this crate never return errors. They report problems through a
//! [`TestContext`], which offers exactly four capabilities: registering a
//! cleanup callback, recording a soft failure, failing hard and skipping the
//! rest of the test. Any test runner able to provide these can host the
//! helpers.
//!
//! Two implementations ship with the crate:
//!
//! - [`Harness`] adapts an ordinary `#[test]` function.
//! - [`RecordingContext`] records every call so helper behaviour can itself be
//!   asserted on.

use std::fmt;

mod harness;
mod recording;

pub use harness::Harness;
pub use recording::RecordingContext;

/// Callback registered with [`TestContext::cleanup`].
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// Capabilities a test runner exposes to fail-fast helpers.
///
/// Implementations must be usable from background threads: the mock HTTP
/// server reports unscripted requests from its listener thread.
pub trait TestContext: Send + Sync {
    /// Register `cleanup` to run when the test completes.
    ///
    /// Cleanups run in last-registered, first-run order.
    fn cleanup(&self, cleanup: Cleanup);

    /// Record a failure and let the test continue.
    fn error(&self, message: &str);

    /// Record a failure and stop the current test immediately.
    fn fatal(&self, message: &str) -> !;

    /// Stop the current test without failing it.
    fn skip(&self, reason: &str) -> !;
}

/// Unwind payload raised by [`RecordingContext::fatal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalSignal(pub String);

/// Unwind payload raised by [`TestContext::skip`] implementations in this
/// crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSignal(pub String);

impl fmt::Display for FatalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl fmt::Display for SkipSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "skipped: {}", self.0) }
}

/// Turn a `Result` into its success value or a hard test failure.
///
/// ```
/// use testkit::{Harness, OrFatal};
///
/// Harness::run(|t| {
///     let n: u32 = "42".parse().or_fatal(t, || "parse answer".to_owned());
///     assert_eq!(n, 42);
/// });
/// ```
pub trait OrFatal<T> {
    /// Return the success value, or call [`TestContext::fatal`] with
    /// `"{what}: {error}"`.
    fn or_fatal(self, ctx: &(impl TestContext + ?Sized), what: impl FnOnce() -> String) -> T;
}

impl<T, E: fmt::Display> OrFatal<T> for Result<T, E> {
    #[track_caller]
    fn or_fatal(self, ctx: &(impl TestContext + ?Sized), what: impl FnOnce() -> String) -> T {
        match self {
            Ok(value) => value,
            Err(err) => ctx.fatal(&format!("{}: {err}", what())),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn or_fatal_passes_success_through() {
        let ctx = RecordingContext::new();
        let value: Result<u8, String> = Ok(7);
        assert_eq!(value.or_fatal(&ctx, || "unused".to_owned()), 7);
        assert!(ctx.fatals().is_empty());
    }

    #[rstest]
    fn or_fatal_reports_context_and_error() {
        let ctx = RecordingContext::new();
        let value: Result<u8, String> = Err("boom".to_owned());
        let outcome = ctx.catch(|| value.or_fatal(&ctx, || "load fixture".to_owned()));
        assert!(outcome.is_none());
        assert_eq!(ctx.fatals(), vec!["load fixture: boom".to_owned()]);
    }

    #[rstest]
    fn signals_display_their_message() {
        assert_eq!(FatalSignal("stop".into()).to_string(), "stop");
        assert_eq!(SkipSignal("offline".into()).to_string(), "skipped: offline");
    }
}
