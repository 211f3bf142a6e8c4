//! Re-readable in-memory request bodies.

use std::{
    convert::Infallible,
    io,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};

/// A fully buffered body with its own read cursor.
///
/// The bytes are immutable and shared between clones; each clone keeps an
/// independent cursor, so reading one view never drains another.
///
/// ```
/// use std::io::Read;
///
/// use testkit::http::ReplayBody;
///
/// let mut first = ReplayBody::new("req body");
/// let second = first.clone();
///
/// let mut buf = String::new();
/// first.read_to_string(&mut buf).expect("read body");
/// assert_eq!(buf, "req body");
/// assert_eq!(second.remaining(), b"req body");
/// assert_eq!(first.contents(), second.contents());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayBody {
    data: Bytes,
    pos: usize,
}

impl ReplayBody {
    /// Wrap `data` in a body positioned at its start.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// The complete body, independent of the read cursor.
    #[must_use]
    pub fn contents(&self) -> Bytes { self.data.clone() }

    /// Bytes not yet consumed through [`io::Read`] or [`Body`].
    #[must_use]
    pub fn remaining(&self) -> &[u8] { self.data.get(self.pos..).unwrap_or_default() }

    /// Total body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.data.len() }

    /// Whether the body holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Move the read cursor back to the start.
    pub fn rewind(&mut self) { self.pos = 0; }
}

impl From<Bytes> for ReplayBody {
    fn from(data: Bytes) -> Self { Self::new(data) }
}

impl From<Vec<u8>> for ReplayBody {
    fn from(data: Vec<u8>) -> Self { Self::new(data) }
}

impl From<&'static str> for ReplayBody {
    fn from(data: &'static str) -> Self { Self::new(data) }
}

impl io::Read for ReplayBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.remaining().len().min(buf.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), self.remaining().get(..n)) {
            dst.copy_from_slice(src);
        }
        self.pos += n;
        Ok(n)
    }
}

impl Body for ReplayBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.pos >= this.data.len() {
            return Poll::Ready(None);
        }
        let chunk = this.data.slice(this.pos..);
        this.pos = this.data.len();
        Poll::Ready(Some(Ok(Frame::data(chunk))))
    }

    fn is_end_stream(&self) -> bool { self.pos >= self.data.len() }

    fn size_hint(&self) -> SizeHint { SizeHint::with_exact(self.remaining().len() as u64) }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use http_body_util::BodyExt;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn reads_advance_only_their_own_cursor() {
        let mut body = ReplayBody::new("abcdef");
        let copy = body.clone();
        let mut buf = [0_u8; 4];
        assert_eq!(body.read(&mut buf).expect("read"), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(body.remaining(), b"ef");
        assert_eq!(copy.remaining(), b"abcdef");
    }

    #[rstest]
    fn rewind_restarts_reading() {
        let mut body = ReplayBody::new("xyz");
        let mut out = Vec::new();
        body.read_to_end(&mut out).expect("first read");
        assert!(body.remaining().is_empty());
        body.rewind();
        out.clear();
        body.read_to_end(&mut out).expect("second read");
        assert_eq!(out, b"xyz");
    }

    #[rstest]
    fn empty_body_is_end_of_stream() {
        let body = ReplayBody::default();
        assert!(body.is_empty());
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[rstest]
    #[tokio::test]
    async fn collects_unread_remainder_as_http_body() {
        let mut body = ReplayBody::new("hello world");
        let mut skip = [0_u8; 6];
        body.read_exact(&mut skip).expect("skip prefix");
        let collected = body.clone().collect().await.expect("collect").to_bytes();
        assert_eq!(collected, Bytes::from_static(b"world"));
        assert_eq!(body.contents(), Bytes::from_static(b"hello world"));
    }
}
