//! votewire core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level contracts of the vote-result stream:
//! the STOMP frame codec, the push-message normalizer, and the in-memory
//! meeting snapshot with its field-wise merge. It intentionally carries no
//! transport or runtime dependencies so it can be reused in multiple
//! contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `VoteWireError`/`Result` so a bad
//! frame from the backend can never crash the client.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, VoteWireError};
