//! In-memory content source for testing.

use crate::error::{ErrorKind, Result};
use crate::source::{ContentSource, Transfer};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// Chunk size for mock streams; small enough that progress fires repeatedly.
const CHUNK: usize = 8;

/// In-memory [`ContentSource`] for testing.
///
/// Serves canned bytes in small chunks and can inject mid-transfer failures
/// or stall forever, so the store's rollback and in-flight-guard behaviour
/// can be exercised without a network.
#[derive(Debug, Default)]
pub struct MockSource {
    books: HashMap<String, Vec<u8>>,
    thumbnails: HashMap<String, Vec<u8>>,
    fail_books: bool,
    fail_thumbnails: bool,
    stall_books: bool,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(mut self, id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.books.insert(id.into(), data.into());
        self
    }

    pub fn with_thumbnail(mut self, id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.thumbnails.insert(id.into(), data.into());
        self
    }

    /// Book transfers emit one chunk, then fail.
    pub fn failing_books(mut self) -> Self {
        self.fail_books = true;
        self
    }

    /// Thumbnail transfers emit one chunk, then fail.
    pub fn failing_thumbnails(mut self) -> Self {
        self.fail_thumbnails = true;
        self
    }

    /// Book fetches never resolve; for exercising the in-flight guard.
    pub fn stalling_books(mut self) -> Self {
        self.stall_books = true;
        self
    }

    fn transfer_from(data: Option<&Vec<u8>>, fail: bool) -> Result<Transfer> {
        let Some(data) = data else {
            exn::bail!(ErrorKind::Source("no such entity in mock source".to_string()));
        };
        let total = data.len() as u64;
        let mut items: Vec<Result<Bytes>> =
            data.chunks(CHUNK).map(|chunk| Ok(Bytes::copy_from_slice(chunk))).collect();
        if fail {
            items.truncate(1);
            items.push(Err(ErrorKind::Source("injected transfer failure".to_string()).into()));
        }
        Ok(Transfer {
            total_bytes: Some(total),
            stream: Box::pin(futures::stream::iter(items)),
        })
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn fetch_book(&self, book_id: &str) -> Result<Transfer> {
        if self.stall_books {
            futures::future::pending::<()>().await;
        }
        Self::transfer_from(self.books.get(book_id), self.fail_books)
    }

    async fn fetch_thumbnail(&self, book_id: &str) -> Result<Transfer> {
        Self::transfer_from(self.thumbnails.get(book_id), self.fail_thumbnails)
    }
}
