//! Test helpers shared across server modules.

use std::{
    io::{Read, Write},
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener, TcpStream},
    time::Duration,
};

use rstest::fixture;

use crate::context::RecordingContext;

#[fixture]
pub fn ctx() -> RecordingContext { RecordingContext::new() }

#[fixture]
/// Returns a bound [`StdTcpListener`] on a free loopback port.
///
/// Keeping the listener bound prevents another process from claiming the
/// port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

/// Status line and body of a raw HTTP/1.1 exchange.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Send a bodiless request with `Connection: close` and read the reply.
pub fn get(addr: SocketAddr, path: &str) -> RawResponse { send(addr, "GET", path, "") }

/// Send a request with `Connection: close` and read the whole reply.
///
/// # Panics
///
/// Panics if the exchange fails at the socket level or the reply is not
/// HTTP.
pub fn send(addr: SocketAddr, method: &str, path: &str, body: &str) -> RawResponse {
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {}\r\nConnection: \
         close\r\n\r\n{body}",
        body.len()
    );
    send_raw(addr, &request)
}

/// Write `request` verbatim and read until the server closes the connection.
///
/// # Panics
///
/// Panics if the exchange fails at the socket level or the reply is not
/// HTTP.
pub fn send_raw(addr: SocketAddr, request: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).expect("connect to mock server");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    stream.write_all(request.as_bytes()).expect("write request");

    let mut reply = String::new();
    stream.read_to_string(&mut reply).expect("read reply");
    let (head, body) = reply.split_once("\r\n\r\n").expect("reply has a header block");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("reply has a status code");
    RawResponse {
        status,
        body: body.to_owned(),
    }
}
