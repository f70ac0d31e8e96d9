//! Byte-stream port the shelf downloads through.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

pub type SourceHandle = Arc<dyn ContentSource + Send + Sync>;

/// One remote transfer: expected size (when advertised) plus the bytes.
pub struct Transfer {
    pub total_bytes: Option<u64>,
    pub stream: ByteStream,
}

impl std::fmt::Debug for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

/// Provider of book and thumbnail byte streams.
///
/// The store itself never speaks HTTP; the catalog client implements this
/// trait over the authenticated request pipeline, and tests substitute an
/// in-memory source.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Stream the primary book file.
    async fn fetch_book(&self, book_id: &str) -> Result<Transfer>;

    /// Stream the cover thumbnail.
    async fn fetch_thumbnail(&self, book_id: &str) -> Result<Transfer>;
}
