//! Per-connection HTTP handling for [`MockServer`](super::MockServer).

use std::{convert::Infallible, net::SocketAddr, panic::AssertUnwindSafe, sync::Arc};

use bytes::Bytes;
use futures::FutureExt;
use http::{Request, Response};
use http_body_util::Full;
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use log::{debug, error, warn};
use tokio::{net::TcpStream, select};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::Shared;
use crate::http::clone_request;

/// Message reported when a request arrives with nothing left to play back.
pub(super) const NO_MORE_RESPONSES: &str = "no more responses to give";

/// Spawn a task serving one connection, logging and discarding any panics.
///
/// A panic here is normally the test context's `fatal` unwinding out of the
/// request handler; the connection is dropped and the client sees a transport
/// error.
pub(super) fn spawn_connection_task(
    stream: TcpStream,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    tracker: &TaskTracker,
) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!("Failed to retrieve peer address: error={e}");
            None
        }
    };
    tracker.spawn(async move {
        let fut = AssertUnwindSafe(serve_connection(stream, peer_addr, shared, shutdown))
            .catch_unwind();

        if let Err(panic) = fut.await {
            let panic_msg = crate::panic::format_panic(panic);
            // Emit via both `log` and `tracing` for tests that capture either.
            error!("connection task panicked: panic={panic_msg}, peer_addr={peer_addr:?}");
            tracing::error!(panic = %panic_msg, ?peer_addr, "connection task panicked");
        }
    });
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
) {
    let service = service_fn(move |req| {
        let shared = Arc::clone(&shared);
        async move { Ok::<_, Infallible>(handle_request(&shared, req).await) }
    });
    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = select! {
        res = conn.as_mut() => res,
        () = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(e) = result {
        debug!("connection closed with error: error={e}, peer_addr={peer_addr:?}");
    }
}

/// Record `req` and answer it with the next scripted response.
async fn handle_request(shared: &Shared, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let fallback_host = shared.addr.to_string();
    let (_, recorded) = clone_request(shared.ctx(), req, shared.scheme(), &fallback_host).await;

    // The session lock must be released before `fatal` unwinds.
    let next = shared.session().exchange(recorded);
    let Some(scripted) = next else {
        warn!("unscripted request: method={method}, uri={uri}");
        shared.ctx().fatal(NO_MORE_RESPONSES);
    };

    let (status, body) = scripted.into_parts();
    tracing::debug!(
        %method,
        %uri,
        status = status.as_u16(),
        body_len = body.len(),
        "mock response sent"
    );
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}
