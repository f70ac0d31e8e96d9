//! Offline bookshelf.
//!
//! A durable local mirror of downloaded books, independent of connectivity.
//! Each downloaded book is three co-located artifacts sharing one filename
//! stem (the [`IdentityKey`]): the book file, a metadata snapshot for offline
//! detail display, and the cover thumbnail.
//!
//! Downloads are all-or-nothing: the three transfers run concurrently, are
//! staged under temporary names, and only promote to their final names once
//! every one of them has succeeded. Any failure sweeps the staging files and
//! leaves the shelf exactly as it was.
//!
//! The shelf itself is just a directory; listing is a rescan keyed off the
//! metadata snapshots, and deletion is idempotent per artifact. Bytes come
//! from a [`ContentSource`] port so the store never speaks HTTP itself.

pub mod error;

mod key;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod progress;
mod source;
mod store;

pub use crate::key::{CONTENT_EXT, IdentityKey};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockSource;
pub use crate::progress::{DownloadProgress, NoProgress};
pub use crate::source::{ByteStream, ContentSource, SourceHandle, Transfer};
pub use crate::store::{OfflineBook, OfflineStore, Presence};
