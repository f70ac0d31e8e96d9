//! Book entity and its nested payloads.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single book as served by `/api/v1/books/{id}` and the list endpoints.
///
/// This is also the exact record the offline store serializes to the
/// `.meta.json` snapshot, so detail screens work without a server round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub series_id: String,
    pub series_title: String,
    pub library_id: String,
    /// Filename-derived display name; prefer `metadata.title` for humans.
    pub name: String,
    pub url: String,
    pub number: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub file_last_modified: OffsetDateTime,
    /// Human-readable size, e.g. "12.3 MiB".
    pub size: String,
    pub size_bytes: u64,
    pub file_hash: String,
    pub deleted: bool,
    pub oneshot: bool,
    pub media: Media,
    pub metadata: BookMetadata,
    #[serde(default)]
    pub read_progress: Option<ReadProgress>,
}

/// Media analysis results for a book file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub status: String,
    pub media_type: String,
    pub media_profile: String,
    pub pages_count: i32,
    pub comment: String,
    pub epub_divina_compatible: bool,
    pub epub_is_kepub: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    pub title: String,
    pub summary: String,
    /// Display number within the series ("4", "4.5", "Extra").
    pub number: String,
    pub number_sort: f64,
    /// Date or datetime string depending on server version; kept verbatim.
    #[serde(default)]
    pub release_date: Option<String>,
    pub authors: Vec<Author>,
    pub tags: Vec<String>,
    pub isbn: String,
    pub links: Vec<WebLink>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLink {
    pub label: String,
    pub url: String,
}

/// Per-user reading position, absent until the book has been opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadProgress {
    pub page: i32,
    pub completed: bool,
    pub device_id: String,
    pub device_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub read_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_book_json() -> serde_json::Value {
        serde_json::json!({
            "id": "0K3NK9SJEB26D",
            "seriesId": "0K3NK9SGR8YG1",
            "seriesTitle": "Usagi Drop",
            "libraryId": "0K3NK9S6AFPJH",
            "name": "Usagi Drop v01",
            "url": "/books/Usagi Drop/Usagi Drop v01.epub",
            "number": 1,
            "created": "2024-11-02T09:12:44Z",
            "lastModified": "2025-01-15T20:01:03Z",
            "fileLastModified": "2024-11-01T23:58:10Z",
            "size": "12.3 MiB",
            "sizeBytes": 12897484u64,
            "fileHash": "9c0b3f",
            "deleted": false,
            "oneshot": false,
            "media": {
                "status": "READY",
                "mediaType": "application/epub+zip",
                "mediaProfile": "EPUB",
                "pagesCount": 212,
                "comment": "",
                "epubDivinaCompatible": false,
                "epubIsKepub": false
            },
            "metadata": {
                "title": "Usagi Drop, Vol. 1",
                "summary": "Daikichi takes in Rin.",
                "number": "1",
                "numberSort": 1.0,
                "releaseDate": "2008-07-08",
                "authors": [{ "name": "Yumi Unita", "role": "writer" }],
                "tags": ["slice of life"],
                "isbn": "9780759531222",
                "links": [],
                "created": "2024-11-02T09:12:44Z",
                "lastModified": "2024-11-02T09:12:44Z"
            },
            "readProgress": null
        })
    }

    #[test]
    fn test_deserialize_book() {
        let book: Book = serde_json::from_value(sample_book_json()).unwrap();
        assert_eq!(book.id, "0K3NK9SJEB26D");
        assert_eq!(book.metadata.title, "Usagi Drop, Vol. 1");
        assert_eq!(book.media.pages_count, 212);
        assert_eq!(book.metadata.release_date.as_deref(), Some("2008-07-08"));
        assert!(book.read_progress.is_none());
    }

    #[test]
    fn test_book_round_trips() {
        let book: Book = serde_json::from_value(sample_book_json()).unwrap();
        let json = serde_json::to_string(&book).unwrap();
        let again: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(book, again);
    }

    #[test]
    fn test_read_progress_is_optional_and_absent_field_tolerated() {
        let mut value = sample_book_json();
        value.as_object_mut().unwrap().remove("readProgress");
        let book: Book = serde_json::from_value(value).unwrap();
        assert!(book.read_progress.is_none());
    }
}
