//! Serde models for the Komga REST API.
//!
//! These types mirror the JSON payloads served by a Komga instance. They are
//! pure data: every other crate (session, catalog client, offline store)
//! consumes them, and the offline store persists [`Book`] verbatim as the
//! on-disk metadata snapshot, so the types round-trip through serde without
//! loss.

mod book;
mod library;
mod page;
mod series;
mod user;

pub use crate::book::{Author, Book, BookMetadata, Media, ReadProgress, WebLink};
pub use crate::library::Library;
pub use crate::page::{Page, Pageable, Sort};
pub use crate::series::{AlternateTitle, Series, SeriesBooksMetadata, SeriesMetadata};
pub use crate::user::{AgeRestriction, Restriction, User};
