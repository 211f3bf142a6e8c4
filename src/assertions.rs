//! Assertions that record soft failures.

use std::fmt::Display;

use regex::Regex;

use crate::context::TestContext;

/// Check that some line of `err`'s message starts with `prefix`.
///
/// `prefix` is a regular expression anchored at the start of any line.
/// Records a soft failure when `err` is `None` or nothing matches; the
/// test continues either way.
///
/// ```
/// use testkit::{RecordingContext, assertions::assert_err_prefix};
///
/// let ctx = RecordingContext::new();
/// let err: Result<(), String> = Err("context\nopen config: not found".to_owned());
/// assert_err_prefix(&ctx, err.err(), "open config");
/// assert!(ctx.errors().is_empty());
/// ```
///
/// # Panics
///
/// Fails the test hard if `prefix` is not a valid regular expression.
#[track_caller]
pub fn assert_err_prefix<E: Display>(
    ctx: &(impl TestContext + ?Sized),
    err: Option<E>,
    prefix: &str,
) {
    let pattern = format!("(?m)^{prefix}");
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => ctx.fatal(&format!("invalid error prefix pattern {pattern:?}: {e}")),
    };
    let Some(err) = err else {
        ctx.error("expected error not to be None");
        return;
    };
    let message = err.to_string();
    if !re.is_match(&message) {
        ctx.error(&format!("expected error {message:?} to match {pattern:?}"));
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::*;
    use crate::context::RecordingContext;

    #[rstest]
    #[case("permission denied: /etc", "permission")]
    #[case("first line\nsecond: boom", "second")]
    #[case("code 42 returned", r"code \d+")]
    fn matching_prefix_passes(#[case] message: &str, #[case] prefix: &str) {
        let ctx = RecordingContext::new();
        assert_err_prefix(&ctx, Some(message), prefix);
        assert!(ctx.errors().is_empty());
    }

    #[rstest]
    fn mid_line_match_fails() {
        let ctx = RecordingContext::new();
        assert_err_prefix(&ctx, Some(io::Error::other("not permission")), "permission");
        assert_eq!(
            ctx.errors(),
            vec![r#"expected error "not permission" to match "(?m)^permission""#.to_owned()]
        );
    }

    #[rstest]
    fn missing_error_fails_softly() {
        let ctx = RecordingContext::new();
        assert_err_prefix(&ctx, None::<io::Error>, "anything");
        assert_eq!(ctx.errors(), vec!["expected error not to be None".to_owned()]);
        assert!(ctx.fatals().is_empty());
    }

    #[rstest]
    fn invalid_pattern_is_fatal() {
        let ctx = RecordingContext::new();
        assert!(ctx.catch(|| assert_err_prefix(&ctx, Some("x"), "(")).is_none());
        assert_eq!(ctx.fatals().len(), 1);
    }
}
