//! Background listener thread for [`MockServer`](super::MockServer).
//!
//! The listener runs on a dedicated OS thread that owns a current-thread
//! tokio runtime, so tests using the server need no runtime of their own.

mod accept;
mod backoff;

use std::{
    net::TcpListener as StdTcpListener,
    sync::Arc,
    thread::{self, JoinHandle},
};

#[cfg(test)]
use accept::MockAcceptListener;
use accept::{AcceptLoopOptions, accept_loop, drain_connections};
pub use backoff::BackoffConfig;
use log::{debug, error};
use tokio::{net::TcpListener, runtime::Builder};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{ServerConfig, ServerError, Shared};

const THREAD_NAME: &str = "testkit-mock-http";

/// Owner of a running listener thread.
///
/// [`ListenerHandle::stop`] consumes the handle, so the thread is joined at
/// most once.
#[derive(Debug)]
pub(super) struct ListenerHandle {
    shutdown: CancellationToken,
    thread: JoinHandle<()>,
}

impl ListenerHandle {
    /// Serve `listener` on a new background thread.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] if the socket cannot be handed to tokio or
    /// the runtime or thread cannot be created.
    pub(super) fn spawn(
        listener: StdTcpListener,
        shared: Arc<Shared>,
        config: &ServerConfig,
    ) -> Result<Self, ServerError> {
        listener
            .set_nonblocking(true)
            .map_err(ServerError::Listener)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;
        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(listener).map_err(ServerError::Listener)?
        };

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let options = AcceptLoopOptions {
            shutdown: shutdown.clone(),
            tracker: tracker.clone(),
            backoff: config.backoff(),
        };
        let grace = config.shutdown_grace_period();
        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || {
                runtime.block_on(async move {
                    accept_loop(Arc::new(listener), shared, options).await;
                    drain_connections(&tracker, grace).await;
                });
                debug!("mock server listener thread exiting");
            })
            .map_err(ServerError::Thread)?;

        Ok(Self { shutdown, thread })
    }

    /// Cancel the accept loop and wait for the thread to finish.
    ///
    /// Must not be called from the listener thread itself.
    pub(super) fn stop(self) {
        self.shutdown.cancel();
        if let Err(panic) = self.thread.join() {
            let panic_msg = crate::panic::format_panic(panic);
            error!("mock server listener thread panicked: panic={panic_msg}");
        }
    }
}
