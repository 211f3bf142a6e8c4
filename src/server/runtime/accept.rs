//! Accept loop feeding connections to the mock server.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::warn;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::{Duration, sleep},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::backoff::BackoffConfig;
use crate::server::{Shared, connection::spawn_connection_task};

/// Source of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

#[derive(Debug)]
pub(in crate::server) struct AcceptLoopOptions {
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
    pub backoff: BackoffConfig,
}

/// Accept connections until `shutdown` is cancelled.
///
/// Each accepted stream is served on its own task tracked by `tracker`.
/// Accept failures are logged and retried after an exponentially growing
/// delay; they never end the loop.
pub(in crate::server) async fn accept_loop<L>(
    listener: Arc<L>,
    shared: Arc<Shared>,
    options: AcceptLoopOptions,
) where
    L: AcceptListener + 'static,
{
    let AcceptLoopOptions {
        shutdown,
        tracker,
        backoff,
    } = options;
    let backoff = backoff.normalized();
    let mut delay = backoff.initial_delay;
    loop {
        select! {
            biased;

            () = shutdown.cancelled() => break,
            res = listener.accept() => match res {
                Ok((stream, _)) => {
                    spawn_connection_task(stream, Arc::clone(&shared), shutdown.clone(), &tracker);
                    delay = backoff.initial_delay;
                }
                Err(e) => {
                    let local_addr = listener.local_addr().ok();
                    warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                    sleep(delay).await;
                    delay = backoff.next_delay(delay);
                }
            },
        }
    }
}

/// Wait for tracked connection tasks, giving up after `grace`.
pub(in crate::server) async fn drain_connections(tracker: &TaskTracker, grace: Duration) {
    tracker.close();
    if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
        warn!(
            "connections still open after shutdown grace period: open={}, grace={grace:?}",
            tracker.len()
        );
    }
}
