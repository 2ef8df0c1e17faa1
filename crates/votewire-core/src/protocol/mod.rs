//! Protocol modules (STOMP framing + realtime envelopes + snapshots).
//!
//! This module hosts the wire formats of the result stream:
//! - `frame`: STOMP 1.2 text frames with header escaping and heartbeats.
//! - `envelope`: normalization of pushed JSON bodies into typed envelopes.
//! - `snapshot`: the in-memory meeting view and its field-wise merge.
//!
//! All parsers are panic-free: malformed input is reported as
//! `VoteWireError` instead of panicking or indexing raw buffers, keeping
//! the client resilient to backend message-shape drift.

pub mod envelope;
pub mod frame;
pub mod snapshot;
