//! Call-site configuration for [`MockServer`](super::MockServer).

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use super::runtime::BackoffConfig;

/// Default time allowed for open connections to finish after `close`.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Settings applied when a mock server starts.
///
/// The defaults bind an ephemeral port on the loopback interface, which is
/// what almost every test wants.
///
/// ```
/// use std::time::Duration;
///
/// use testkit::server::ServerConfig;
///
/// let config = ServerConfig::default().shutdown_grace(Duration::from_millis(50));
/// assert_eq!(config.bind_addr().port(), 0);
/// assert_eq!(config.shutdown_grace_period(), Duration::from_millis(50));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    bind_addr: SocketAddr,
    backoff: BackoffConfig,
    shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0),
            backoff: BackoffConfig::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServerConfig {
    /// Listen on `addr` instead of an ephemeral loopback port.
    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Back-off applied when accepting a connection fails.
    ///
    /// The value is normalised before use; see [`BackoffConfig::normalized`].
    #[must_use]
    pub fn accept_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff.normalized();
        self
    }

    /// How long `close` waits for open connections before dropping them.
    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Address the listener binds to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr { self.bind_addr }

    /// Accept back-off in effect.
    #[must_use]
    pub const fn backoff(&self) -> BackoffConfig { self.backoff }

    /// Grace period granted to open connections on close.
    #[must_use]
    pub const fn shutdown_grace_period(&self) -> Duration { self.shutdown_grace }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_to_ephemeral_loopback() {
        let config = ServerConfig::default();
        assert!(config.bind_addr().ip().is_loopback());
        assert_eq!(config.bind_addr().port(), 0);
        assert_eq!(config.backoff(), BackoffConfig::default());
        assert_eq!(config.shutdown_grace_period(), DEFAULT_SHUTDOWN_GRACE);
    }

    #[rstest]
    fn accept_backoff_is_normalized() {
        let config = ServerConfig::default().accept_backoff(BackoffConfig {
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::ZERO,
        });
        assert_eq!(config.backoff().initial_delay, Duration::from_millis(1));
        assert_eq!(config.backoff().max_delay, Duration::from_millis(50));
    }
}
