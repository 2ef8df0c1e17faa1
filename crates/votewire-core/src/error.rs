//! Shared error type across votewire crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, VoteWireError>;

/// Unified error type used by core and the client runtime.
#[derive(Debug, Error)]
pub enum VoteWireError {
    /// Configuration rejected at load time.
    #[error("config: {0}")]
    Config(String),
    /// The "ongoing meeting" lookup failed.
    #[error("meeting resolution failed: {0}")]
    Resolution(String),
    /// A REST call failed (network or non-2xx).
    #[error("api request failed: {0}")]
    Api(String),
    /// WebSocket-level failure (handshake, drop, send).
    #[error("transport: {0}")]
    Transport(String),
    /// Malformed STOMP frame or push body.
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl VoteWireError {
    /// Stable label used in logs and status surfaces.
    pub fn kind(&self) -> &'static str {
        match self {
            VoteWireError::Config(_) => "CONFIG",
            VoteWireError::Resolution(_) => "RESOLUTION",
            VoteWireError::Api(_) => "API",
            VoteWireError::Transport(_) => "TRANSPORT",
            VoteWireError::Protocol(_) => "PROTOCOL",
            VoteWireError::Internal(_) => "INTERNAL",
        }
    }
}
