//! Readers and writers that fail after a fixed number of bytes.

use std::io::{self, Read, Write};

use crate::error::TestError;

/// Reader passing through at most `limit` bytes of `inner`, then failing.
///
/// Once `limit` bytes have been read every further call returns the
/// configured error. An error or end of input from `inner` before the limit
/// is passed through unchanged.
///
/// ```
/// use std::io::Read;
///
/// use testkit::io::ErrReader;
///
/// let mut reader = ErrReader::new(&b"abcdef"[..], 3);
/// let mut buf = Vec::new();
/// let err = reader.read_to_end(&mut buf).expect_err("limit reached");
/// assert_eq!(buf, b"abc");
/// assert_eq!(err.to_string(), "testkit test error");
/// ```
#[derive(Debug)]
pub struct ErrReader<R, E = TestError> {
    inner: R,
    limit: usize,
    offset: usize,
    err: E,
}

impl<R: Read> ErrReader<R> {
    /// Wrap `inner`, failing with [`TestError`] after `limit` bytes.
    pub fn new(inner: R, limit: usize) -> Self { Self::with_error(inner, limit, TestError) }
}

impl<R: Read, E> ErrReader<R, E>
where
    E: Clone + Into<io::Error>,
{
    /// Wrap `inner`, failing with `err` after `limit` bytes.
    pub fn with_error(inner: R, limit: usize, err: E) -> Self {
        Self {
            inner,
            limit,
            offset: 0,
            err,
        }
    }

    /// Bytes passed through so far.
    #[must_use]
    pub fn offset(&self) -> usize { self.offset }

    /// Unwrap the inner reader.
    pub fn into_inner(self) -> R { self.inner }
}

impl<R: Read, E> Read for ErrReader<R, E>
where
    E: Clone + Into<io::Error>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let allowed = self.limit.saturating_sub(self.offset);
        if allowed == 0 {
            return Err(self.err.clone().into());
        }
        let len = buf.len().min(allowed);
        let n = self.inner.read(&mut buf[..len])?;
        self.offset += n;
        Ok(n)
    }
}

/// Writer passing at most `limit` bytes to `inner`, then failing.
///
/// A write crossing the limit is shortened to the bytes still allowed; the
/// next write returns the configured error. An error from `inner` before
/// the limit is passed through unchanged.
///
/// ```
/// use std::io::Write;
///
/// use testkit::io::ErrWriter;
///
/// let mut writer = ErrWriter::new(Vec::new(), 4);
/// let err = writer.write_all(b"abcdef").expect_err("limit reached");
/// assert_eq!(err.to_string(), "testkit test error");
/// assert_eq!(writer.into_inner(), b"abcd");
/// ```
#[derive(Debug)]
pub struct ErrWriter<W, E = TestError> {
    inner: W,
    limit: usize,
    offset: usize,
    err: E,
}

impl<W: Write> ErrWriter<W> {
    /// Wrap `inner`, failing with [`TestError`] after `limit` bytes.
    pub fn new(inner: W, limit: usize) -> Self { Self::with_error(inner, limit, TestError) }
}

impl<W: Write, E> ErrWriter<W, E>
where
    E: Clone + Into<io::Error>,
{
    /// Wrap `inner`, failing with `err` after `limit` bytes.
    pub fn with_error(inner: W, limit: usize, err: E) -> Self {
        Self {
            inner,
            limit,
            offset: 0,
            err,
        }
    }

    /// Bytes passed through so far.
    #[must_use]
    pub fn offset(&self) -> usize { self.offset }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write, E> Write for ErrWriter<W, E>
where
    E: Clone + Into<io::Error>,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let allowed = self.limit.saturating_sub(self.offset);
        if allowed == 0 {
            return Err(self.err.clone().into());
        }
        let len = buf.len().min(allowed);
        let n = self.inner.write(&buf[..len])?;
        self.offset += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}
