//! Log output of the mock server.

use std::time::Duration;

use log::Level;
use reqwest::blocking::Client;
use rstest::rstest;
use serial_test::serial;
use testkit::{MockServer, RecordingContext, wait::wait};
use testkit_testing::{LoggerHandle, get, http_client, logger};

#[rstest]
#[serial]
fn unscripted_request_panic_is_logged(mut logger: LoggerHandle, http_client: Client) {
    let ctx = RecordingContext::new();
    let server = MockServer::start(&ctx);
    logger.clear();

    assert!(get(&http_client, &server.url()).is_err());

    let logged = wait(Duration::from_secs(2), || {
        logger
            .find(
                Level::Error,
                &["connection task panicked", "panic=no more responses to give"],
            )
            .is_some()
    });
    assert!(logged, "panic log not found");
    ctx.run_cleanups();
}

#[rstest]
#[serial]
fn listening_address_is_logged(mut logger: LoggerHandle) {
    logger.clear();
    let ctx = RecordingContext::new();
    let server = MockServer::start(&ctx);

    let line = format!("addr={}", server.addr());
    assert!(
        logger
            .find(Level::Info, &["mock server listening", &line])
            .is_some()
    );
    ctx.run_cleanups();
}
