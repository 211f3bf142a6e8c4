//! Scripted mock HTTP server.
//!
//! [`MockServer`] listens on a loopback port, answers each request with the
//! next queued [`ScriptedResponse`] and keeps a copy of every request it
//! answered. When the owning test completes it checks that every scripted
//! response was consumed and shuts itself down.
//!
//! ```
//! use std::io::{Read, Write};
//! use std::net::TcpStream;
//!
//! use testkit::{Harness, server::MockServer};
//!
//! Harness::run(|t| {
//!     let server = MockServer::start(t);
//!     server.enqueue_response(200, "pong");
//!
//!     let mut stream = TcpStream::connect(server.addr()).expect("connect");
//!     stream
//!         .write_all(b"GET /ping?x=1 HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
//!         .expect("write request");
//!     let mut reply = String::new();
//!     stream.read_to_string(&mut reply).expect("read reply");
//!
//!     assert!(reply.starts_with("HTTP/1.1 200 OK"));
//!     assert!(reply.ends_with("pong"));
//!     assert_eq!(server.request_count(), 1);
//!     assert_eq!(server.query_values(0).get("x"), Some("1"));
//! });
//! ```

use std::{
    fmt,
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use log::{debug, info};

use crate::{
    context::TestContext,
    http::{QueryValues, RecordedRequest},
};

mod config;
mod connection;
mod error;
mod runtime;
mod session;
#[cfg(test)]
pub(crate) mod test_util;

pub use config::ServerConfig;
pub use error::ServerError;
use runtime::ListenerHandle;
pub use runtime::BackoffConfig;
use session::Session;
pub use session::ScriptedResponse;

const SCHEME: &str = "http";

/// State shared by the server handle, its teardown callback and the
/// listener thread.
pub(crate) struct Shared {
    ctx: Arc<dyn TestContext>,
    session: Mutex<Session>,
    listener: Mutex<Option<ListenerHandle>>,
    addr: SocketAddr,
    scheme: &'static str,
}

impl Shared {
    fn new(ctx: Arc<dyn TestContext>, addr: SocketAddr) -> Self {
        Self {
            ctx,
            session: Mutex::default(),
            listener: Mutex::new(None),
            addr,
            scheme: SCHEME,
        }
    }

    fn ctx(&self) -> &dyn TestContext { &*self.ctx }

    fn scheme(&self) -> &'static str { self.scheme }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listener(&self) -> MutexGuard<'_, Option<ListenerHandle>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a running scripted HTTP server.
///
/// Cloning the handle shares the same server. Dropping a handle does not
/// stop the server: teardown is registered with the test context when the
/// server starts and runs with the test's other cleanups.
#[derive(Clone)]
pub struct MockServer {
    shared: Arc<Shared>,
}

impl fmt::Debug for MockServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockServer")
            .field("addr", &self.shared.addr)
            .field("request_count", &self.request_count())
            .field("pending_count", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl MockServer {
    /// Start a server on an ephemeral loopback port.
    ///
    /// The server is torn down when `ctx` runs its cleanups.
    ///
    /// # Panics
    ///
    /// Fails the test through `ctx` if the server cannot start.
    #[track_caller]
    pub fn start<C>(ctx: &C) -> Self
    where
        C: TestContext + Clone + 'static,
    {
        Self::with_config(ctx, ServerConfig::default())
    }

    /// Start a server with explicit settings.
    ///
    /// # Panics
    ///
    /// Fails the test through `ctx` if the server cannot start.
    #[track_caller]
    pub fn with_config<C>(ctx: &C, config: ServerConfig) -> Self
    where
        C: TestContext + Clone + 'static,
    {
        match Self::try_start(Arc::new(ctx.clone()), &config) {
            Ok(server) => {
                let teardown = server.clone();
                ctx.cleanup(Box::new(move || teardown.teardown()));
                server
            }
            Err(err) => ctx.fatal(&format!("start mock server: {err}")),
        }
    }

    fn try_start(ctx: Arc<dyn TestContext>, config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener =
            StdTcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ServerError::Listener)?;

        let shared = Arc::new(Shared::new(ctx, local_addr));
        let handle = ListenerHandle::spawn(listener, Arc::clone(&shared), config)?;
        *shared.listener() = Some(handle);
        info!("mock server listening: addr={local_addr}");
        Ok(Self { shared })
    }

    /// Base URL of the server, `http://127.0.0.1:<port>` by default.
    #[must_use]
    pub fn url(&self) -> String { format!("{}://{}", self.shared.scheme, self.shared.addr) }

    /// Socket address the server listens on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.shared.addr }

    /// Queue a response with `status` and `body` for a future request.
    ///
    /// ```
    /// use testkit::{Harness, server::MockServer};
    ///
    /// Harness::run(|t| {
    ///     let server = MockServer::start(t);
    ///     server.enqueue_response(200, "a").enqueue_response(201, "b");
    ///     assert_eq!(server.pending_count(), 2);
    ///     server.close();
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Fails the test if `status` is not a valid HTTP status code.
    #[track_caller]
    pub fn enqueue_response(&self, status: u16, body: impl Into<Bytes>) -> &Self {
        let status = self.status_code(status);
        self.enqueue(ScriptedResponse::with_body(status, body))
    }

    /// Queue a response with `status` and an empty body.
    ///
    /// # Panics
    ///
    /// Fails the test if `status` is not a valid HTTP status code.
    #[track_caller]
    pub fn enqueue_status(&self, status: u16) -> &Self {
        let status = self.status_code(status);
        self.enqueue(ScriptedResponse::empty(status))
    }

    /// Queue `response` for a future request.
    pub fn enqueue(&self, response: ScriptedResponse) -> &Self {
        self.shared.session().enqueue(response);
        self
    }

    /// Number of requests answered so far.
    #[must_use]
    pub fn request_count(&self) -> usize { self.shared.session().request_count() }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn pending_count(&self) -> usize { self.shared.session().pending() }

    /// Copy of the request answered at position `index`.
    ///
    /// # Panics
    ///
    /// Fails the test if no request with that index was recorded.
    #[track_caller]
    #[must_use]
    pub fn request(&self, index: usize) -> RecordedRequest {
        self.with_request(index, RecordedRequest::clone)
    }

    /// Query parameters of request `index`.
    ///
    /// # Panics
    ///
    /// Fails the test if no request with that index was recorded.
    #[track_caller]
    #[must_use]
    pub fn query_values(&self, index: usize) -> QueryValues {
        self.with_request(index, RecordedRequest::query_values)
    }

    /// Body of request `index`.
    ///
    /// # Panics
    ///
    /// Fails the test if no request with that index was recorded.
    #[track_caller]
    #[must_use]
    pub fn body(&self, index: usize) -> Bytes { self.with_request(index, RecordedRequest::body) }

    /// Body of request `index` as text, with invalid UTF-8 replaced.
    ///
    /// # Panics
    ///
    /// Fails the test if no request with that index was recorded.
    #[track_caller]
    #[must_use]
    pub fn body_string(&self, index: usize) -> String {
        self.with_request(index, RecordedRequest::body_string)
    }

    /// Headers of request `index`.
    ///
    /// # Panics
    ///
    /// Fails the test if no request with that index was recorded.
    #[track_caller]
    #[must_use]
    pub fn headers(&self, index: usize) -> HeaderMap {
        self.with_request(index, |req| req.headers().clone())
    }

    /// Stop accepting connections and shut the listener down.
    ///
    /// Open connections get the configured grace period to finish. Pending
    /// responses are dropped; recorded requests stay available. Calling
    /// `close` again does nothing.
    pub fn close(&self) {
        let handle = self.shared.listener().take();
        let Some(handle) = handle else {
            return;
        };
        handle.stop();
        let dropped = {
            let mut session = self.shared.session();
            let dropped = session.pending();
            session.clear_pending();
            dropped
        };
        debug!(
            "mock server closed: addr={}, dropped_responses={dropped}",
            self.shared.addr
        );
    }

    fn teardown(&self) {
        let (registered, seen) = {
            let session = self.shared.session();
            (session.registered(), session.request_count())
        };
        if registered != seen {
            self.shared
                .ctx()
                .error(&format!("expected {registered} requests got {seen}"));
        }
        self.close();
    }

    #[track_caller]
    fn status_code(&self, status: u16) -> StatusCode {
        match StatusCode::from_u16(status) {
            Ok(code) => code,
            Err(err) => self
                .shared
                .ctx()
                .fatal(&format!("invalid status code {status}: {err}")),
        }
    }

    #[track_caller]
    fn with_request<R>(&self, index: usize, f: impl FnOnce(&RecordedRequest) -> R) -> R {
        let found = self.shared.session().recorded(index).map(f);
        match found {
            Some(value) => value,
            None => self
                .shared
                .ctx()
                .fatal(&format!("no request with index {index} recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;
    use crate::{context::RecordingContext, server::test_util::{ctx, get, send_raw}};

    #[rstest]
    fn url_points_at_the_bound_port(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        assert_eq!(server.url(), format!("http://127.0.0.1:{}", server.addr().port()));
        assert_eq!(ctx.cleanup_count(), 1);
        ctx.run_cleanups();
        assert!(ctx.errors().is_empty());
    }

    #[rstest]
    fn records_requests_in_arrival_order(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        server.enqueue_response(200, "one").enqueue_status(204);

        assert_eq!(get(server.addr(), "/first?a=1&a=2").status, 200);
        assert_eq!(get(server.addr(), "/second").status, 204);

        assert_eq!(server.request_count(), 2);
        assert_eq!(server.request(0).url().path(), "/first");
        assert_eq!(server.query_values(0).get_all("a"), ["1", "2"]);
        assert_eq!(server.request(1).url().path(), "/second");
        ctx.run_cleanups();
        assert!(ctx.errors().is_empty());
    }

    #[rstest]
    fn http10_request_without_host_is_recorded(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        server.enqueue_response(200, "old client");

        let reply = send_raw(server.addr(), "GET /x?a=1 HTTP/1.0\r\n\r\n");

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, "old client");
        assert!(ctx.fatals().is_empty());
        assert_eq!(server.request_count(), 1);
        let recorded = server.request(0);
        assert_eq!(recorded.url().as_str(), format!("{}/x?a=1", server.url()));
        assert_eq!(recorded.version(), http::Version::HTTP_10);
        ctx.run_cleanups();
        assert!(ctx.errors().is_empty());
    }

    #[rstest]
    fn teardown_reports_unconsumed_responses(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        server.enqueue_response(200, "a").enqueue_response(200, "b");
        get(server.addr(), "/");

        ctx.run_cleanups();

        assert_eq!(ctx.errors(), vec!["expected 2 requests got 1".to_owned()]);
        assert_eq!(server.pending_count(), 0);
        assert_eq!(server.request_count(), 1);
    }

    #[rstest]
    fn close_is_idempotent(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        server.close();
        server.close();
        ctx.run_cleanups();
        assert!(ctx.errors().is_empty());
        assert!(std::net::TcpStream::connect_timeout(
            &server.addr(),
            Duration::from_millis(200)
        )
        .is_err());
    }

    #[rstest]
    fn out_of_range_index_is_fatal(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        assert!(ctx.catch(|| server.body(0)).is_none());
        assert_eq!(ctx.fatals(), vec!["no request with index 0 recorded".to_owned()]);
        ctx.run_cleanups();
    }

    #[rstest]
    fn invalid_status_is_fatal(ctx: RecordingContext) {
        let server = MockServer::start(&ctx);
        assert!(ctx.catch(|| { server.enqueue_status(42); }).is_none());
        assert_eq!(server.pending_count(), 0);
        assert_eq!(ctx.fatals().len(), 1);
        assert!(ctx.fatals()[0].starts_with("invalid status code 42"));
        ctx.run_cleanups();
    }

    #[rstest]
    fn occupied_address_is_fatal(ctx: RecordingContext) {
        let first = MockServer::start(&ctx);
        let config = ServerConfig::default().bind(first.addr());
        assert!(ctx.catch(|| MockServer::with_config(&ctx, config)).is_none());
        assert_eq!(ctx.fatals().len(), 1);
        assert!(ctx.fatals()[0].starts_with("start mock server: failed to bind mock server"));
        ctx.run_cleanups();
    }
}
