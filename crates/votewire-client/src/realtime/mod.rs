//! Realtime synchronization layer for meeting results.
//!
//! `connection` owns the subscription lifecycle; `provider` composes it
//! with the merge and the initial REST fetch into the surface the host
//! application consumes.

pub mod connection;
pub mod provider;

pub use connection::{
    meeting_topic, ConnectionHandle, ConnectionManager, ConnectionPhase, ConnectionStatus,
};
pub use provider::{ProviderHandle, SnapshotProvider};
