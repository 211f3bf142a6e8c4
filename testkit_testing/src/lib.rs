//! Shared fixtures for `testkit`'s integration tests.
//!
//! Provides a serialised [`logtest`] capture and a blocking HTTP client for
//! talking to a [`MockServer`](testkit::MockServer).
//!
//! ```no_run
//! use testkit::{Harness, MockServer};
//! use testkit_testing::{get, http_client};
//!
//! Harness::run(|t| {
//!     let server = MockServer::start(t);
//!     server.enqueue_response(200, "hi");
//!     let reply = get(&http_client(), &server.url()).expect("GET");
//!     assert_eq!(reply.body, "hi");
//! });
//! ```

pub mod client;
pub mod logging;

pub use client::{Reply, get, http_client, post};
pub use logging::{LoggerHandle, logger};
