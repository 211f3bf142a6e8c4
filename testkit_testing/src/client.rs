//! Blocking HTTP client helpers for exercising a `MockServer`.

use std::time::Duration;

use reqwest::blocking::{Body, Client, Response};
use rstest::fixture;

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn read(response: Response) -> reqwest::Result<Self> {
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Self { status, body })
    }
}

/// Client that does not keep idle connections, so a closed server never
/// sees a stale pooled connection.
#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn http_client() -> Client {
    Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .expect("build HTTP client")
}

/// `GET url`.
///
/// # Errors
///
/// Returns the transport error when the exchange fails.
pub fn get(client: &Client, url: &str) -> reqwest::Result<Reply> {
    client.get(url).send().and_then(Reply::read)
}

/// `POST url` with `body`.
///
/// # Errors
///
/// Returns the transport error when the exchange fails.
pub fn post(client: &Client, url: &str, body: impl Into<Body>) -> reqwest::Result<Reply> {
    client.post(url).body(body).send().and_then(Reply::read)
}
