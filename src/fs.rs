//! Filesystem helpers that fail the test instead of returning errors.
//!
//! Every helper takes the [`TestContext`] first and calls
//! [`TestContext::fatal`] with the operation, the path and the underlying
//! error when the operation fails. Temporary files and directories created
//! here are removed when the context runs its cleanups.

use std::{
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::warn;
use tempfile::{Builder, TempPath};

use crate::context::{OrFatal, TestContext};

/// Open `path` read-only.
///
/// The file closes when the returned handle is dropped.
#[track_caller]
pub fn open_file(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> File {
    let path = path.as_ref();
    File::open(path).or_fatal(ctx, || format!("open {}", path.display()))
}

/// Create or truncate `path` for writing.
#[track_caller]
pub fn create_file(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> File {
    let path = path.as_ref();
    File::create(path).or_fatal(ctx, || format!("create {}", path.display()))
}

/// Create an empty temporary file named `<prefix><random>` in `dir`, or in
/// the system temporary directory when `dir` is `None`.
///
/// Returns the open file and its path. The file is removed at cleanup.
///
/// ```
/// use std::io::Write;
///
/// use testkit::{Harness, fs::temp_file};
///
/// let mut seen = None;
/// Harness::run(|t| {
///     let (mut file, path) = temp_file(t, None, "scratch-");
///     file.write_all(b"data").expect("write");
///     assert!(path.exists());
///     seen = Some(path);
/// });
/// assert!(!seen.expect("path").exists());
/// ```
#[track_caller]
pub fn temp_file(
    ctx: &(impl TestContext + ?Sized),
    dir: Option<&Path>,
    prefix: &str,
) -> (File, PathBuf) {
    let named = temp_builder(prefix, dir).or_fatal(ctx, || "create temporary file".to_owned());
    let (file, temp_path) = named.into_parts();
    let path = temp_path.to_path_buf();
    remove_at_cleanup(ctx, temp_path);
    (file, path)
}

/// Copy everything from `reader` into a new temporary file in `dir`.
///
/// Returns the file's path. The file is removed at cleanup.
#[track_caller]
pub fn temp_file_from_reader(
    ctx: &(impl TestContext + ?Sized),
    dir: Option<&Path>,
    mut reader: impl Read,
) -> PathBuf {
    let mut named = temp_builder("", dir).or_fatal(ctx, || "create temporary file".to_owned());
    let copied = io::copy(&mut reader, named.as_file_mut());
    let (_, temp_path) = named.into_parts();
    let path = temp_path.to_path_buf();
    remove_at_cleanup(ctx, temp_path);
    copied.or_fatal(ctx, || format!("write {}", path.display()));
    path
}

/// Write `data` to a new temporary file in `dir`.
///
/// Returns the file's path. The file is removed at cleanup.
#[track_caller]
pub fn temp_file_from_bytes(
    ctx: &(impl TestContext + ?Sized),
    dir: Option<&Path>,
    data: &[u8],
) -> PathBuf {
    temp_file_from_reader(ctx, dir, data)
}

fn temp_builder(prefix: &str, dir: Option<&Path>) -> io::Result<tempfile::NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(prefix);
    match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
}

fn remove_at_cleanup(ctx: &(impl TestContext + ?Sized), temp_path: TempPath) {
    ctx.cleanup(Box::new(move || {
        let path = temp_path.to_path_buf();
        if let Err(e) = temp_path.close() {
            warn!("failed to remove temporary file: path={}, error={e}", path.display());
        }
    }));
}

/// Read the whole of `path`.
#[track_caller]
pub fn read_file(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> Vec<u8> {
    let path = path.as_ref();
    fs::read(path).or_fatal(ctx, || format!("read {}", path.display()))
}

/// Size of `file` in bytes.
#[track_caller]
pub fn file_size(ctx: &(impl TestContext + ?Sized), file: &File) -> u64 {
    file.metadata()
        .or_fatal(ctx, || "stat file".to_owned())
        .len()
}

/// Replace every occurrence of `from` with `to` in the text file at `path`.
#[track_caller]
pub fn replace_all_in_file(
    ctx: &(impl TestContext + ?Sized),
    path: impl AsRef<Path>,
    from: &str,
    to: &str,
) {
    let path = path.as_ref();
    let text = String::from_utf8_lossy(&read_file(ctx, path)).replace(from, to);
    fs::write(path, text).or_fatal(ctx, || format!("write {}", path.display()));
}

/// Names of the entries in directory `path`, in the order the OS returns
/// them.
#[track_caller]
pub fn read_dir_names(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    let what = || format!("read directory {}", path.display());
    fs::read_dir(path)
        .or_fatal(ctx, what)
        .map(|entry| {
            entry
                .or_fatal(ctx, what)
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

/// Current position of `seeker`.
#[track_caller]
pub fn current_offset(ctx: &(impl TestContext + ?Sized), seeker: &mut impl Seek) -> u64 {
    seek(ctx, seeker, SeekFrom::Current(0))
}

/// Move `seeker` to `pos` and return the new offset from the start.
#[track_caller]
pub fn seek(ctx: &(impl TestContext + ?Sized), seeker: &mut impl Seek, pos: SeekFrom) -> u64 {
    seeker.seek(pos).or_fatal(ctx, || format!("seek to {pos:?}"))
}

/// Create a temporary directory named `<prefix><random>` in `dir`, or in
/// the system temporary directory when `dir` is `None`.
///
/// The directory and its contents are removed at cleanup.
#[track_caller]
pub fn temp_dir(ctx: &(impl TestContext + ?Sized), dir: Option<&Path>, prefix: &str) -> PathBuf {
    let mut builder = Builder::new();
    builder.prefix(prefix);
    let created = match dir {
        Some(dir) => builder.tempdir_in(dir),
        None => builder.tempdir(),
    };
    let temp = created.or_fatal(ctx, || "create temporary directory".to_owned());
    let path = temp.path().to_path_buf();
    ctx.cleanup(Box::new(move || {
        let path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!("failed to remove temporary directory: path={}, error={e}", path.display());
        }
    }));
    path
}

/// Create directory `path` (owner-only permissions on Unix) and return it.
///
/// The parent must already exist.
#[track_caller]
pub fn create_dir(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .or_fatal(ctx, || format!("create directory {}", path.display()));
    path.to_path_buf()
}

/// Absolute form of `path`, resolved against the working directory.
#[track_caller]
pub fn abs_path(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    std::path::absolute(path).or_fatal(ctx, || format!("absolute path of {}", path.display()))
}

/// Last modification time of `path`.
#[track_caller]
pub fn mod_time(ctx: &(impl TestContext + ?Sized), path: impl AsRef<Path>) -> SystemTime {
    let path = path.as_ref();
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .or_fatal(ctx, || format!("stat {}", path.display()))
}

/// The process working directory.
#[track_caller]
pub fn current_dir(ctx: &(impl TestContext + ?Sized)) -> PathBuf {
    std::env::current_dir().or_fatal(ctx, || "get working directory".to_owned())
}
