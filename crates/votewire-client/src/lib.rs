//! votewire client runtime.
//!
//! This crate wires the transport session, connection manager, snapshot
//! provider, REST collaborators, and configuration into a cohesive
//! realtime client for meeting results. It is intended to be consumed by
//! the watcher binary (`main.rs`), host applications, and integration
//! tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod realtime;
pub mod transport;
