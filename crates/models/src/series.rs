//! Series entity and its aggregated metadata payloads.

use crate::book::{Author, WebLink};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A series as served by `/api/v1/series/*` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: String,
    pub library_id: String,
    pub name: String,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub file_last_modified: OffsetDateTime,
    pub books_count: i32,
    pub books_read_count: i32,
    pub books_unread_count: i32,
    pub books_in_progress_count: i32,
    pub deleted: bool,
    pub oneshot: bool,
    pub metadata: SeriesMetadata,
    pub books_metadata: SeriesBooksMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetadata {
    pub status: String,
    pub title: String,
    pub title_sort: String,
    pub summary: String,
    pub publisher: String,
    pub reading_direction: String,
    pub age_rating: Option<i32>,
    pub language: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub total_book_count: Option<i32>,
    pub sharing_labels: Vec<String>,
    pub links: Vec<WebLink>,
    pub alternate_titles: Vec<AlternateTitle>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

/// Metadata aggregated by the server across the books of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBooksMetadata {
    pub authors: Vec<Author>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    pub summary: String,
    pub summary_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateTitle {
    pub label: String,
    pub title: String,
}
