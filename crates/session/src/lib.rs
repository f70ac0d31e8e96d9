//! Session and credential pipeline.
//!
//! This crate owns everything between "the user typed a password" and "an
//! authenticated byte stream": deriving the outbound credential header from
//! the vault, capturing credential directives from responses, and the login /
//! logout / current-user state machine.
//!
//! # Architecture
//! - [`cookie`] — pure header/directive logic, no I/O.
//! - [`Transport`] — the request pipeline every remote call goes through:
//!   outbound credential injection strictly before send, inbound capture
//!   strictly before the response reaches its caller.
//! - [`Session`] — login state machine and the cached authenticated-user
//!   snapshot.

pub mod cookie;
pub mod error;

mod session;
mod transport;

pub use crate::session::{LOGIN_TIMEOUT, Session};
pub use crate::transport::{DEFAULT_TIMEOUT, Transport};
