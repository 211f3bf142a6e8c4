#![doc(html_root_url = "https://docs.rs/testkit/latest")]
//! Public API for the `testkit` library.
//!
//! Fail-fast helpers for tests: each helper performs one operation and, on
//! error, fails the running test through a [`TestContext`] instead of
//! returning the error. The crate also provides [`MockServer`], a scripted
//! HTTP server that records the requests it receives and answers them with a
//! queue of canned responses.
//!
//! ```
//! use testkit::{Harness, fs, server::MockServer};
//!
//! Harness::run(|t| {
//!     let dir = fs::temp_dir(t, None, "demo-");
//!     assert!(dir.is_dir());
//!
//!     let server = MockServer::start(t);
//!     assert!(server.url().starts_with("http://127.0.0.1:"));
//! });
//! ```

pub mod assertions;
pub mod codec;
pub mod context;
pub mod env;
pub mod error;
pub mod fs;
pub mod hash;
pub mod http;
pub mod io;
pub mod net;
pub mod panic;
pub mod random;
pub mod server;
pub mod wait;

pub use context::{FatalSignal, Harness, OrFatal, RecordingContext, SkipSignal, TestContext};
pub use error::TestError;
pub use server::{MockServer, ScriptedResponse, ServerConfig};
