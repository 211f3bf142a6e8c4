//! Errors raised while starting a [`MockServer`](super::MockServer).

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Errors that may occur while bringing the listener up.
///
/// [`MockServer::start`](super::MockServer::start) turns these into hard test
/// failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listening socket failed.
    #[error("failed to bind mock server to {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Configuring the bound socket for async use failed.
    #[error("failed to configure mock server listener: {0}")]
    Listener(#[source] io::Error),
    /// Building the listener's runtime failed.
    #[error("failed to build mock server runtime: {0}")]
    Runtime(#[source] io::Error),
    /// Spawning the listener thread failed.
    #[error("failed to spawn mock server thread: {0}")]
    Thread(#[source] io::Error),
}
