//! Snapshots of requests received by the mock server.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Version};
use url::{Url, form_urlencoded};

use super::ReplayBody;

/// An independently readable copy of an inbound HTTP request.
///
/// The URL is absolute: its scheme is the receiving server's and its
/// authority is the one the client addressed. Cloning produces a value that
/// shares no mutable state with the original.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    method: Method,
    url: Url,
    version: Version,
    headers: HeaderMap,
    body: ReplayBody,
}

impl RecordedRequest {
    pub(crate) fn new(
        method: Method,
        url: Url,
        version: Version,
        headers: HeaderMap,
        body: ReplayBody,
    ) -> Self {
        Self {
            method,
            url,
            version,
            headers,
            body,
        }
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method { &self.method }

    /// Absolute request URL, including the query string.
    #[must_use]
    pub fn url(&self) -> &Url { &self.url }

    /// HTTP version the request arrived with.
    #[must_use]
    pub fn version(&self) -> Version { self.version }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Mutable access to this copy's headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// Complete request body. Repeated calls return the same bytes.
    #[must_use]
    pub fn body(&self) -> Bytes { self.body.contents() }

    /// Request body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_string(&self) -> String { String::from_utf8_lossy(&self.body.contents()).into_owned() }

    /// Readable view of the body with this copy's cursor.
    pub fn body_mut(&mut self) -> &mut ReplayBody { &mut self.body }

    /// Parsed query string parameters.
    #[must_use]
    pub fn query_values(&self) -> QueryValues { QueryValues::parse(self.url.query().unwrap_or("")) }

    /// Rebuild an [`http::Request`] carrying this copy's body.
    ///
    /// # Errors
    ///
    /// Returns an [`http::Error`] if the stored URL is not a valid request
    /// URI.
    pub fn into_request(self) -> Result<Request<ReplayBody>, http::Error> {
        let mut builder = Request::builder()
            .method(self.method)
            .uri(self.url.as_str())
            .version(self.version);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }
        builder.body(self.body)
    }
}

/// Query string parameters as an ordered multi-map.
///
/// ```
/// use testkit::http::QueryValues;
///
/// let values = QueryValues::parse("k0=v0&k1=a&k1=b");
/// assert_eq!(values.get("k0"), Some("v0"));
/// assert_eq!(values.get_all("k1"), ["a", "b"]);
/// assert_eq!(values.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryValues(BTreeMap<String, Vec<String>>);

impl QueryValues {
    /// Parse an `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// Every value for `key`, in query order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] { self.0.get(key).map_or(&[], Vec::as_slice) }

    /// Whether `key` appears in the query.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool { self.0.contains_key(key) }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the query has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Iterate keys with their values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, String)> for QueryValues {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in iter {
            map.entry(key).or_default().push(value);
        }
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use http::header::{CONTENT_TYPE, HeaderValue};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn recorded() -> RecordedRequest {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        RecordedRequest::new(
            Method::POST,
            Url::parse("http://127.0.0.1:8080/path?k0=v0&k0=v1&flag").expect("url"),
            Version::HTTP_11,
            headers,
            ReplayBody::new("req body"),
        )
    }

    #[rstest]
    fn clone_is_independent(recorded: RecordedRequest) {
        let mut copy = recorded.clone();
        copy.headers_mut().remove(CONTENT_TYPE);
        let mut drained = Vec::new();
        copy.body_mut().read_to_end(&mut drained).expect("read");

        assert!(recorded.headers().contains_key(CONTENT_TYPE));
        assert_eq!(recorded.clone().body_mut().remaining(), b"req body");
        assert_eq!(copy.body(), Bytes::from_static(b"req body"));
    }

    #[rstest]
    fn query_values_keep_repeated_keys(recorded: RecordedRequest) {
        let values = recorded.query_values();
        assert_eq!(values.get_all("k0"), ["v0", "v1"]);
        assert_eq!(values.get("flag"), Some(""));
        assert!(!values.contains_key("missing"));
    }

    #[rstest]
    fn missing_query_is_empty() {
        assert!(QueryValues::parse("").is_empty());
    }

    #[rstest]
    fn into_request_preserves_parts(recorded: RecordedRequest) {
        let request = recorded.into_request().expect("rebuild request");
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "http://127.0.0.1:8080/path?k0=v0&k0=v1&flag");
        assert_eq!(request.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(request.body().remaining(), b"req body");
    }

    #[rstest]
    fn body_string_is_lossy() {
        let recorded = RecordedRequest::new(
            Method::PUT,
            Url::parse("http://localhost/").expect("url"),
            Version::HTTP_11,
            HeaderMap::new(),
            ReplayBody::new(vec![b'o', b'k', 0xff]),
        );
        assert_eq!(recorded.body_string(), "ok\u{fffd}");
    }
}
