use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use log::Level;
use logtest::{Logger, Record};
use rstest::fixture;

/// Handle to the global logger with exclusive access.
///
/// This guard ensures tests do not interfere with each other's log capture by
/// serialising access to a [`logtest::Logger`].
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the global [`Logger`] instance.
    ///
    /// A test that panicked while holding the logger does not block later
    /// tests.
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let guard = logger.lock().unwrap_or_else(PoisonError::into_inner);

        Self { guard }
    }

    /// Discard every captured record.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Drain captured records, returning the first at `level` whose message
    /// contains every fragment in `parts`.
    pub fn find(&mut self, level: Level, parts: &[&str]) -> Option<Record> {
        let mut found = None;
        while let Some(record) = self.guard.pop() {
            if found.is_none()
                && record.level() == level
                && parts.iter().all(|part| record.args().contains(part))
            {
                found = Some(record);
            }
        }
        found
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
