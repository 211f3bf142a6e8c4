//! Random strings and file names.

use std::path::{Path, PathBuf};

use rand::{Rng, distributions::Uniform};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DEFAULT_PREFIX: &str = "file-";
const DEFAULT_EXT: &str = ".txt";
const STEM_LEN: usize = 7;

/// Random string of `len` ASCII letters.
#[must_use]
pub fn rand_str(len: usize) -> String {
    let index = Uniform::from(0..LETTERS.len());
    rand::thread_rng()
        .sample_iter(index)
        .take(len)
        .map(|i| char::from(LETTERS[i]))
        .collect()
}

/// Random file path `<dir>/<prefix><7 letters><ext>`.
///
/// An empty `prefix` becomes `file-` and an empty `ext` becomes `.txt`.
/// The file is not created.
///
/// ```
/// use testkit::random::rand_file_name;
///
/// let path = rand_file_name("/tmp", "", "");
/// let name = path.file_name().and_then(|n| n.to_str()).expect("utf-8 name");
/// assert!(name.starts_with("file-") && name.ends_with(".txt"));
/// assert_eq!(name.len(), "file-".len() + 7 + ".txt".len());
/// ```
#[must_use]
pub fn rand_file_name(dir: impl AsRef<Path>, prefix: &str, ext: &str) -> PathBuf {
    let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
    let ext = if ext.is_empty() { DEFAULT_EXT } else { ext };
    dir.as_ref()
        .join(format!("{prefix}{}{ext}", rand_str(STEM_LEN)))
}
