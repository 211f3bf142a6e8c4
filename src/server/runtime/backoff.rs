//! Back-off applied when the mock server fails to accept a connection.

use std::time::Duration;

/// Exponential back-off between failed `accept()` calls.
///
/// The first retry waits `initial_delay`; each further failure doubles the
/// wait up to `max_delay`. A successful accept resets the delay.
///
/// Defaults: 10 milliseconds initial, 1 second maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Clamp both delays to at least one millisecond and order them.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use testkit::server::BackoffConfig;
    ///
    /// let cfg = BackoffConfig {
    ///     initial_delay: Duration::from_millis(5),
    ///     max_delay: Duration::from_millis(1),
    /// }
    /// .normalized();
    ///
    /// assert_eq!(cfg.initial_delay, Duration::from_millis(1));
    /// assert_eq!(cfg.max_delay, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(self) -> Self {
        let floor = Duration::from_millis(1);
        let a = self.initial_delay.max(floor);
        let b = self.max_delay.max(floor);
        Self {
            initial_delay: a.min(b),
            max_delay: a.max(b),
        }
    }

    /// Delay to use after a failure that waited `current`.
    #[must_use]
    pub(crate) fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }
}
