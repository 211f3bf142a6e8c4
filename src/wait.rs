//! Polling until a condition holds or time runs out.

use std::{
    thread,
    time::{Duration, Instant},
};

/// Call `f` repeatedly until it returns `true` or `max` has elapsed.
///
/// `f` is always called at least once. Returns whether `f` succeeded. A
/// `max` too large to add to the current time never expires.
///
/// ```
/// use std::time::Duration;
///
/// use testkit::wait::wait;
///
/// let mut calls = 0;
/// assert!(wait(Duration::from_secs(1), || {
///     calls += 1;
///     calls == 3
/// }));
/// ```
pub fn wait(max: Duration, mut f: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now().checked_add(max);
    loop {
        if f() {
            return true;
        }
        if expired(deadline, Instant::now()) {
            return false;
        }
        thread::yield_now();
    }
}

/// Like [`wait`], but starts successive calls to `f` at least `throttle`
/// apart.
pub fn wait_throttled(max: Duration, throttle: Duration, mut f: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now().checked_add(max);
    loop {
        let started = Instant::now();
        if f() {
            return true;
        }
        let now = Instant::now();
        if expired(deadline, now) {
            return false;
        }
        let mut pause = throttle.saturating_sub(now.saturating_duration_since(started));
        if let Some(deadline) = deadline {
            pause = pause.min(deadline.saturating_duration_since(now));
        }
        thread::sleep(pause);
    }
}

fn expired(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.is_some_and(|deadline| now >= deadline)
}
