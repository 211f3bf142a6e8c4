//! Internet reachability checks.

use std::{net::ToSocketAddrs, sync::OnceLock};

use log::debug;

use crate::context::TestContext;

const PROBE_HOST: (&str, u16) = ("www.google.com", 80);

static CONNECTED: OnceLock<bool> = OnceLock::new();

/// Whether the Internet looks reachable.
///
/// The first call resolves a well-known host name; the answer is cached for
/// the life of the process.
#[must_use]
pub fn has_net_conn() -> bool { *CONNECTED.get_or_init(probe) }

fn probe() -> bool {
    let connected = PROBE_HOST
        .to_socket_addrs()
        .is_ok_and(|mut addrs| addrs.next().is_some());
    debug!("network probe finished: host={}, connected={connected}", PROBE_HOST.0);
    connected
}

/// Skip the test when the Internet is not reachable.
///
/// # Panics
///
/// Unwinds through [`TestContext::skip`] when offline.
pub fn no_network_skip(ctx: &(impl TestContext + ?Sized)) {
    if !has_net_conn() {
        ctx.skip("skipping test: no Internet connection");
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::context::RecordingContext;

    #[rstest]
    fn probe_result_is_cached() {
        let first = has_net_conn();
        assert_eq!(CONNECTED.get().copied(), Some(first));
        assert_eq!(has_net_conn(), first);
    }

    #[rstest]
    fn skip_follows_reachability() {
        let ctx = RecordingContext::new();
        let ran = ctx.catch(|| no_network_skip(&ctx)).is_some();
        assert_eq!(ran, has_net_conn());
        if !ran {
            assert_eq!(ctx.skips(), vec!["skipping test: no Internet connection".to_owned()]);
        }
    }
}
