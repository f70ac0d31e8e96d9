//! Identity keys and artifact path derivation.

use std::fmt;
use std::path::{Path, PathBuf};

/// Extension of the primary content artifact.
pub const CONTENT_EXT: &str = "epub";
/// Suffix of the metadata snapshot; listing keys off this.
pub(crate) const META_SUFFIX: &str = ".meta.json";
const THUMBNAIL_SUFFIX: &str = ".thumbnail";
/// Suffix appended to artifact paths while a download is staging them.
pub(crate) const STAGE_SUFFIX: &str = ".part";

/// Stable filename stem shared by all three artifacts of one book.
///
/// Derived from the display title plus the remote id. The id is what makes
/// the key unique — two books may share a title, never an id — while the
/// title keeps the shelf directory human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derive the key for a book from its display title and remote id.
    pub fn derive(title: &str, id: &str) -> Self {
        Self(format!("{}-{id}", sanitize(title)))
    }

    /// Reconstruct a key from a filename stem found on disk.
    pub(crate) fn from_stem(stem: impl Into<String>) -> Self {
        Self(stem.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the primary content artifact under `root`.
    pub fn content_path(&self, root: &Path) -> PathBuf {
        root.join(format!("{}.{CONTENT_EXT}", self.0))
    }

    /// Path of the metadata snapshot under `root`.
    pub fn metadata_path(&self, root: &Path) -> PathBuf {
        root.join(format!("{}{META_SUFFIX}", self.0))
    }

    /// Path of the cover thumbnail under `root`.
    pub fn thumbnail_path(&self, root: &Path) -> PathBuf {
        root.join(format!("{}{THUMBNAIL_SUFFIX}", self.0))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The staging twin of an artifact path.
pub(crate) fn staged(path: &Path) -> PathBuf {
    let mut staged = path.to_path_buf().into_os_string();
    staged.push(STAGE_SUFFIX);
    PathBuf::from(staged)
}

/// The key is a filename stem, so it must stay a single path component.
/// Titles are arbitrary user data; separators and NUL get folded to `-`.
fn sanitize(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            c => c,
        })
        .collect()
}
