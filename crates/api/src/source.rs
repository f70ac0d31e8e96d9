//! Byte-stream provider for the offline store.
//!
//! Downloads are authenticated requests like any other: the content and
//! thumbnail streams go through the same pipeline that injects the
//! credential header, so an expiring session token refreshed mid-download
//! is captured exactly as it would be for a catalog call.

use crate::catalog::Catalog;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Method;
use std::time::Duration;
use yomu_offline::error::{ErrorKind as SourceErrorKind, Result as SourceResult};
use yomu_offline::{ContentSource, Transfer};

/// Book files can be large; the transport's browsing timeout would abort
/// them mid-body. Downloads get a deadline of their own.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[async_trait]
impl ContentSource for Catalog {
    async fn fetch_book(&self, book_id: &str) -> SourceResult<Transfer> {
        self.fetch_stream(&format!("/api/v1/books/{book_id}/file")).await
    }

    async fn fetch_thumbnail(&self, book_id: &str) -> SourceResult<Transfer> {
        self.fetch_stream(&format!("/api/v1/books/{book_id}/thumbnail")).await
    }
}

impl Catalog {
    async fn fetch_stream(&self, path: &str) -> SourceResult<Transfer> {
        let builder = self
            .transport()
            .request(Method::GET, path)
            .await
            .map_err(|e| SourceErrorKind::Source(e.to_string()))?
            .timeout(DOWNLOAD_TIMEOUT);
        let response = self
            .transport()
            .execute(builder)
            .await
            .map_err(|e| SourceErrorKind::Source(e.to_string()))?;
        if !response.status().is_success() {
            exn::bail!(SourceErrorKind::Source(format!(
                "server returned status {}",
                response.status().as_u16(),
            )));
        }
        let total_bytes = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(|e| exn::Exn::from(SourceErrorKind::Source(e.to_string())));
        Ok(Transfer {
            total_bytes,
            stream: Box::pin(stream),
        })
    }
}
