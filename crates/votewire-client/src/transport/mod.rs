//! Transport layer (STOMP over WebSocket).
//!
//! `session` owns the socket and the frame-level handshake/send/receive;
//! the connection manager above it owns lifecycle and state.

pub mod session;
