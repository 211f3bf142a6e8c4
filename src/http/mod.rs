//! Request capture primitives shared by the mock server and tests.
//!
//! HTTP bodies are single-consumption streams. [`clone_request`] reads a
//! body exactly once and hands out two [`ReplayBody`] views over the same
//! buffer: one restored onto the live request and one inside the
//! [`RecordedRequest`] kept for later inspection.

mod body;
mod clone;
mod recorded;

pub use body::ReplayBody;
pub use clone::{BodyError, BoxError, clone_request, collect_body, try_clone_request};
pub use recorded::{QueryValues, RecordedRequest};
