//! MD5 digests of files and readers.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use crate::context::{OrFatal, TestContext};

/// Lowercase hex MD5 digest of the file at `path`.
#[track_caller]
pub fn md5_file(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let file = File::open(path).or_fatal(ctx, || format!("open {}", path.display()));
    digest(file).or_fatal(ctx, || format!("hash {}", path.display()))
}

/// Lowercase hex MD5 digest of everything `reader` yields.
///
/// ```
/// use testkit::{Harness, hash::md5_reader};
///
/// Harness::run(|t| {
///     assert_eq!(md5_reader(t, &b"abc"[..]), "900150983cd24fb0d6963f7d28e17f72");
/// });
/// ```
#[track_caller]
pub fn md5_reader(ctx: &(impl TestContext + ?Sized), reader: impl Read) -> String {
    digest(reader).or_fatal(ctx, || "hash reader".to_owned())
}

fn digest(mut reader: impl Read) -> io::Result<String> {
    let mut context = md5::Context::new();
    io::copy(&mut reader, &mut context)?;
    Ok(hex::encode(context.compute().0))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{context::RecordingContext, fs::temp_file_from_bytes, io::ErrReader};

    #[rstest]
    #[case(b"", "d41d8cd98f00b204e9800998ecf8427e")]
    #[case(b"The quick brown fox jumps over the lazy dog", "9e107d9d372bb6826bd81d3542a419d6")]
    fn reader_digest_matches_known_values(#[case] input: &[u8], #[case] expected: &str) {
        let ctx = RecordingContext::new();
        assert_eq!(md5_reader(&ctx, input), expected);
    }

    #[rstest]
    fn file_digest_matches_reader_digest() {
        let ctx = RecordingContext::new();
        let path = temp_file_from_bytes(&ctx, None, b"abc");
        assert_eq!(md5_file(&ctx, &path), md5_reader(&ctx, &b"abc"[..]));
        ctx.run_cleanups();
    }

    #[rstest]
    fn read_failure_is_fatal() {
        let ctx = RecordingContext::new();
        assert!(ctx.catch(|| md5_reader(&ctx, ErrReader::new(&b"abc"[..], 2))).is_none());
        assert_eq!(ctx.fatals(), vec!["hash reader: testkit test error".to_owned()]);
    }
}
