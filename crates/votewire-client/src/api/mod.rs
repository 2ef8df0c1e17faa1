//! REST collaborators consumed by the realtime layer.
//!
//! Only two operations are needed here: resolving the ongoing meeting and
//! fetching the current result snapshot. Everything else the backend
//! offers is outside this subsystem.

pub mod http;

use async_trait::async_trait;

use votewire_core::protocol::snapshot::MeetingSnapshot;
use votewire_core::Result;

pub use http::HttpMeetingApi;

/// Reference to a meeting as the backend lists it.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRef {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Meeting endpoints used by the connection manager and the provider.
#[async_trait]
pub trait MeetingApi: Send + Sync {
    /// The meeting currently in progress, if any.
    async fn ongoing_meeting(&self) -> Result<Option<MeetingRef>>;

    /// Current result snapshot for a meeting. Used for the initial fetch
    /// and manual refresh only, never for the push path.
    async fn realtime_status(&self, meeting_id: &str) -> Result<MeetingSnapshot>;
}
