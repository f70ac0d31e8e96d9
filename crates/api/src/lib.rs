//! Catalog client for the Komga REST API.
//!
//! [`Catalog`] wraps the session crate's request pipeline and exposes the
//! list/detail endpoints the client consumes: libraries, series, books and
//! the server's condition-DSL book search. It also implements the offline
//! store's [`ContentSource`](yomu_offline::ContentSource) port, streaming
//! book files and thumbnails through the same authenticated pipeline.

pub mod error;

mod catalog;
mod source;

pub use crate::catalog::Catalog;
