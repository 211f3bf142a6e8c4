//! Utilities for working with panic payloads.
//!
//! Hard test failures travel as unwinds, so the harness and the mock
//! server's connection tasks need readable text for whatever payload they
//! catch.

use std::{any::Any, fmt};

use crate::context::{FatalSignal, SkipSignal};

/// Wrapper that formats a panic payload when logged or displayed.
///
/// The payload is downcast to `String`, `&'static str`, [`FatalSignal`] or
/// [`SkipSignal`] if possible and falls back to `Debug` formatting
/// otherwise.
///
/// ```
/// use testkit::{FatalSignal, panic::format_panic};
///
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert_eq!(
///     format_panic(Box::new(FatalSignal("no more responses to give".into()))).to_string(),
///     "no more responses to give"
/// );
/// assert!(format_panic(Box::new(5_u32)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else if let Some(signal) = self.0.downcast_ref::<FatalSignal>() {
            fmt::Display::fmt(signal, f)
        } else if let Some(signal) = self.0.downcast_ref::<SkipSignal>() {
            fmt::Display::fmt(signal, f)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Create a [`PanicMessage`] for the given payload.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }
