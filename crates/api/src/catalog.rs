//! List and detail endpoints.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use yomu_models::{Book, Library, Page, Series};
use yomu_session::Transport;

/// Client for the server's catalog endpoints.
///
/// Every request goes through the credential-bearing [`Transport`], so call
/// sites never deal with authentication. Cheap to clone.
#[derive(Clone)]
pub struct Catalog {
    transport: Transport,
}

impl Catalog {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// All libraries visible to the authenticated user.
    pub async fn libraries(&self) -> Result<Vec<Library>> {
        self.get_json("/api/v1/libraries").await
    }

    pub async fn library(&self, library_id: &str) -> Result<Library> {
        self.get_json(&format!("/api/v1/libraries/{library_id}")).await
    }

    /// Recently added series, newest first. Oneshots are excluded; they show
    /// up in the book listings instead.
    pub async fn recently_added_series(&self, page: i32) -> Result<Page<Series>> {
        let builder = self
            .transport
            .request(Method::GET, "/api/v1/series/new")
            .await
            .or_raise(|| ErrorKind::Session)?
            .query(&[("oneshot", "false"), ("page", &page.to_string())]);
        let response = self.transport.execute(builder).await.or_raise(|| ErrorKind::Session)?;
        Self::decode(response).await
    }

    /// Books the user is partway through, most recently read first.
    pub async fn keep_reading(&self, page: i32) -> Result<Page<Book>> {
        let condition = serde_json::json!({
            "condition": {
                "readStatus": { "operator": "is", "value": "IN_PROGRESS" }
            }
        });
        self.book_list(condition, "readProgress.readDate,desc", page).await
    }

    /// Recently added books across all visible libraries.
    pub async fn recently_added_books(&self, page: i32) -> Result<Page<Book>> {
        self.book_list(serde_json::json!({}), "createdDate,desc", page).await
    }

    /// Books of one library, in series reading order.
    pub async fn library_books(&self, library_id: &str, page: i32) -> Result<Page<Book>> {
        let condition = serde_json::json!({
            "condition": {
                "allOf": [
                    { "libraryId": { "operator": "is", "value": library_id } }
                ]
            }
        });
        self.book_list(condition, "series,metadata.numberSort,asc", page).await
    }

    /// Books of one series, in reading order.
    pub async fn series_books(&self, series_id: &str, page: i32) -> Result<Page<Book>> {
        let condition = serde_json::json!({
            "condition": {
                "allOf": [
                    { "seriesId": { "operator": "is", "value": series_id } }
                ]
            }
        });
        self.book_list(condition, "metadata.numberSort,asc", page).await
    }

    /// Full record of one book.
    pub async fn book(&self, book_id: &str) -> Result<Book> {
        self.get_json(&format!("/api/v1/books/{book_id}")).await
    }

    /// `POST /api/v1/books/list` with the server's condition DSL.
    async fn book_list(&self, condition: serde_json::Value, sort: &str, page: i32) -> Result<Page<Book>> {
        tracing::debug!(sort, page, "listing books");
        let builder = self
            .transport
            .request(Method::POST, "/api/v1/books/list")
            .await
            .or_raise(|| ErrorKind::Session)?
            .query(&[("sort", sort), ("page", &page.to_string())])
            .json(&condition);
        let response = self.transport.execute(builder).await.or_raise(|| ErrorKind::Session)?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.transport.get(path).await.or_raise(|| ErrorKind::Session)?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            exn::bail!(ErrorKind::Status(response.status().as_u16()));
        }
        response.json().await.or_raise(|| ErrorKind::Decode)
    }
}
