//! Errors produced by this crate's own building blocks.
//!
//! Fail-fast helpers never return these; they surface through
//! [`TestContext::fatal`](crate::TestContext::fatal). They exist for the
//! pieces that hand errors to other code, such as the readers and writers in
//! [`crate::io`].

use thiserror::Error;

/// General purpose error injected by test doubles.
///
/// [`ErrReader`](crate::io::ErrReader) and
/// [`ErrWriter`](crate::io::ErrWriter) return it (wrapped in
/// [`std::io::Error`]) when no explicit error is configured.
///
/// ```
/// use testkit::TestError;
///
/// assert_eq!(TestError.to_string(), "testkit test error");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("testkit test error")]
pub struct TestError;

impl From<TestError> for std::io::Error {
    fn from(err: TestError) -> Self { std::io::Error::other(err) }
}
