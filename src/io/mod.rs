//! Reading helpers and fault-injecting I/O adapters.

use std::io::{Read, Seek, SeekFrom};

use log::warn;

use crate::context::{OrFatal, TestContext};

mod fault;

pub use fault::{ErrReader, ErrWriter};

/// Read `reader` to the end.
#[track_caller]
pub fn read_all(ctx: &(impl TestContext + ?Sized), mut reader: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .or_fatal(ctx, || "read all".to_owned());
    buf
}

/// Read `reader` to the end as text, replacing invalid UTF-8.
#[track_caller]
pub fn read_all_string(ctx: &(impl TestContext + ?Sized), reader: impl Read) -> String {
    String::from_utf8_lossy(&read_all(ctx, reader)).into_owned()
}

/// Read all of `source` from its start, then return to the position it
/// had before the call.
///
/// ```
/// use std::io::{Cursor, Seek, SeekFrom};
///
/// use testkit::{Harness, io::read_all_from_start};
///
/// Harness::run(|t| {
///     let mut cursor = Cursor::new(b"abcdef".to_vec());
///     cursor.seek(SeekFrom::Start(4)).expect("seek");
///     assert_eq!(read_all_from_start(t, &mut cursor), b"abcdef");
///     assert_eq!(cursor.position(), 4);
/// });
/// ```
#[track_caller]
pub fn read_all_from_start<S>(ctx: &(impl TestContext + ?Sized), source: &mut S) -> Vec<u8>
where
    S: Read + Seek,
{
    let position = source
        .stream_position()
        .or_fatal(ctx, || "get stream position".to_owned());
    source
        .seek(SeekFrom::Start(0))
        .or_fatal(ctx, || "seek to start".to_owned());

    let mut buf = Vec::new();
    let read = source.read_to_end(&mut buf);
    if let Err(e) = source.seek(SeekFrom::Start(position)) {
        warn!("failed to restore stream position: position={position}, error={e}");
    }
    read.or_fatal(ctx, || "read all from start".to_owned());
    buf
}
