//! Scoped environment variable overrides.

use std::ffi::{OsStr, OsString};

use crate::context::TestContext;

/// Set `key` to `value` until the test completes.
///
/// A cleanup restores the previous value, or removes the variable if it was
/// unset. The process environment is global: tests that use this must not
/// run concurrently with other tests reading or writing the same variables.
///
/// ```
/// use testkit::{Harness, env::set_env};
///
/// Harness::run(|t| {
///     set_env(t, "TESTKIT_DOC_VAR", "on");
///     assert_eq!(std::env::var("TESTKIT_DOC_VAR").as_deref(), Ok("on"));
/// });
/// assert!(std::env::var_os("TESTKIT_DOC_VAR").is_none());
/// ```
///
/// # Panics
///
/// Fails the test if `key` is empty or contains `=` or NUL, or `value`
/// contains NUL.
#[track_caller]
pub fn set_env(ctx: &(impl TestContext + ?Sized), key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) {
    let key = key.as_ref();
    let value = value.as_ref();
    if let Some(problem) = invalid_key(key).or_else(|| invalid_value(value)) {
        ctx.fatal(&format!("set environment variable {}: {problem}", key.display()));
    }

    let previous = std::env::var_os(key);
    write_var(key, Some(value));
    let key = key.to_os_string();
    ctx.cleanup(Box::new(move || restore(&key, previous)));
}

fn restore(key: &OsString, previous: Option<OsString>) { write_var(key, previous.as_deref()); }

fn invalid_key(key: &OsStr) -> Option<&'static str> {
    let bytes = key.as_encoded_bytes();
    if bytes.is_empty() {
        Some("empty key")
    } else if bytes.contains(&b'=') {
        Some("key contains '='")
    } else if bytes.contains(&0) {
        Some("key contains NUL")
    } else {
        None
    }
}

fn invalid_value(value: &OsStr) -> Option<&'static str> {
    value
        .as_encoded_bytes()
        .contains(&0)
        .then_some("value contains NUL")
}

#[expect(unsafe_code, reason = "tests mutate the process environment")]
fn write_var(key: &OsStr, value: Option<&OsStr>) {
    // SAFETY: callers own the variables they override and must not run
    // concurrently with other environment readers.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}
