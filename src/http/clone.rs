//! Duplicating requests whose bodies can only be read once.

use bytes::Bytes;
use http::{Request, header::HOST, request::Parts};
use http_body::Body;
use http_body_util::BodyExt;
use thiserror::Error;
use url::Url;

use super::{RecordedRequest, ReplayBody};
use crate::context::TestContext;

/// Boxed error produced by an arbitrary body implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures while buffering or duplicating a request.
#[derive(Debug, Error)]
pub enum BodyError {
    /// Reading the body stream failed.
    #[error("failed to read request body: {0}")]
    Read(#[source] BoxError),
    /// The reconstructed URL did not parse.
    #[error("failed to rebuild request URL {url}: {source}")]
    Url {
        /// The text that failed to parse.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

/// Read a body stream to completion.
///
/// # Errors
///
/// Returns [`BodyError::Read`] if the stream yields an error.
pub async fn collect_body<B>(body: B) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|err| BodyError::Read(err.into()))
}

/// Split `req` into a restored request and an independent recorded copy.
///
/// The body is read once. The returned request and the record each get
/// their own [`ReplayBody`] view, so both can be read in full. The record's
/// URL uses `scheme` and the authority the client addressed: the `Host`
/// header, then the URI's own authority, then `fallback_host` for
/// origin-form requests that carry neither (HTTP/1.0 allows this).
///
/// # Errors
///
/// Returns a [`BodyError`] when the body cannot be read or the URL cannot be
/// rebuilt. The request is consumed either way.
pub async fn try_clone_request<B>(
    req: Request<B>,
    scheme: &str,
    fallback_host: &str,
) -> Result<(Request<ReplayBody>, RecordedRequest), BodyError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    let bytes = collect_body(body).await?;
    let recorded = record_parts(&parts, bytes.clone(), scheme, fallback_host)?;
    Ok((Request::from_parts(parts, ReplayBody::new(bytes)), recorded))
}

/// [`try_clone_request`] that fails the test on error.
///
/// ```
/// use http::Request;
/// use http_body_util::Full;
/// use testkit::{Harness, http::clone_request};
///
/// Harness::run(|t| {
///     let req = Request::post("/upload?k0=v0")
///         .header("host", "example.test")
///         .body(Full::new(bytes::Bytes::from_static(b"payload")))
///         .expect("request");
///     let (live, recorded) =
///         futures::executor::block_on(clone_request(t, req, "http", "localhost"));
///     assert_eq!(live.body().remaining(), b"payload");
///     assert_eq!(recorded.url().as_str(), "http://example.test/upload?k0=v0");
///     assert_eq!(recorded.body_string(), "payload");
/// });
/// ```
pub async fn clone_request<B>(
    ctx: &(impl TestContext + ?Sized),
    req: Request<B>,
    scheme: &str,
    fallback_host: &str,
) -> (Request<ReplayBody>, RecordedRequest)
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match try_clone_request(req, scheme, fallback_host).await {
        Ok(pair) => pair,
        Err(err) => ctx.fatal(&err.to_string()),
    }
}

fn record_parts(
    parts: &Parts,
    body: Bytes,
    scheme: &str,
    fallback_host: &str,
) -> Result<RecordedRequest, BodyError> {
    let authority = parts
        .headers
        .get(HOST)
        .and_then(|host| host.to_str().ok())
        .filter(|host| !host.is_empty())
        .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))
        .unwrap_or(fallback_host);
    let path = parts
        .uri
        .path_and_query()
        .map_or("/", http::uri::PathAndQuery::as_str);
    let text = format!("{scheme}://{authority}{path}");
    let url = Url::parse(&text).map_err(|source| BodyError::Url { url: text, source })?;
    Ok(RecordedRequest::new(
        parts.method.clone(),
        url,
        parts.version,
        parts.headers.clone(),
        ReplayBody::new(body),
    ))
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    use http::Method;
    use http_body::Frame;
    use http_body_util::Full;
    use rstest::rstest;

    use super::*;
    use crate::context::RecordingContext;

    struct FailingBody;

    impl Body for FailingBody {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
            Poll::Ready(Some(Err(io::Error::other("socket reset"))))
        }
    }

    fn post(uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(HOST, "127.0.0.1:9000")
            .header("x-trace", "abc")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .expect("build request")
    }

    #[rstest]
    #[tokio::test]
    async fn both_views_read_the_full_body() {
        let (live, recorded) =
            try_clone_request(post("/?k0=v0", "req body"), "http", "fallback.test")
                .await
                .expect("clone request");

        let live_body = collect_body(live.into_body()).await.expect("live body");
        assert_eq!(live_body, Bytes::from_static(b"req body"));
        assert_eq!(recorded.body(), Bytes::from_static(b"req body"));
        assert_eq!(recorded.url().as_str(), "http://127.0.0.1:9000/?k0=v0");
        assert_eq!(recorded.headers()["x-trace"], "abc");
    }

    #[rstest]
    #[tokio::test]
    async fn scheme_is_rewritten() {
        let (_, recorded) = try_clone_request(post("/secure", ""), "https", "fallback.test")
            .await
            .expect("clone request");
        assert_eq!(recorded.url().scheme(), "https");
        assert!(recorded.body().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn absolute_uri_supplies_authority_without_host() {
        let req = Request::get("http://upstream.test:81/a?b=c")
            .body(Full::new(Bytes::new()))
            .expect("build request");
        let (_, recorded) = try_clone_request(req, "http", "fallback.test")
            .await
            .expect("clone");
        assert_eq!(recorded.url().as_str(), "http://upstream.test:81/a?b=c");
    }

    #[rstest]
    #[tokio::test]
    async fn origin_form_without_host_uses_fallback() {
        let req = Request::get("/a?b=c")
            .version(http::Version::HTTP_10)
            .body(Full::new(Bytes::new()))
            .expect("build");
        let (_, recorded) = try_clone_request(req, "http", "127.0.0.1:9000")
            .await
            .expect("clone");
        assert_eq!(recorded.url().as_str(), "http://127.0.0.1:9000/a?b=c");
        assert_eq!(recorded.version(), http::Version::HTTP_10);
    }

    #[rstest]
    #[tokio::test]
    async fn body_read_failure_is_fatal() {
        let ctx = RecordingContext::new();
        let req = Request::post("/").header(HOST, "h").body(FailingBody).expect("build");
        let outcome = futures::FutureExt::catch_unwind(std::panic::AssertUnwindSafe(
            clone_request(&ctx, req, "http", "h"),
        ))
        .await;
        assert!(outcome.is_err());
        assert_eq!(
            ctx.fatals(),
            vec!["failed to read request body: socket reset".to_owned()]
        );
    }
}
