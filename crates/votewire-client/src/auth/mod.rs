//! Bearer-token access.
//!
//! Token refresh and rotation belong to the host's auth subsystem; this
//! client only re-reads the current value on every (re)connect attempt
//! and on every REST call.

use async_trait::async_trait;

/// Provider of the current bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current token, or `None` when running unauthenticated.
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed token, e.g. from the environment or a test.
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider that never yields a token (public/degraded scenarios).
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}
