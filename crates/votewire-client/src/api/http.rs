//! reqwest-backed implementation of `MeetingApi`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use votewire_core::error::{Result, VoteWireError};
use votewire_core::protocol::snapshot::MeetingSnapshot;

use super::{MeetingApi, MeetingRef};
use crate::auth::TokenProvider;
use crate::config::ApiSection;

pub struct HttpMeetingApi {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpMeetingApi {
    pub fn new(cfg: &ApiSection, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| VoteWireError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// GET a JSON body. `Ok(None)` for 404/204 so callers can treat
    /// "nothing there" as a normal outcome.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.http.get(&url);
        if let Some(token) = self.tokens.bearer_token().await {
            req = req.bearer_auth(token);
        }

        let res = req
            .send()
            .await
            .map_err(|e| VoteWireError::Api(format!("GET {path}: {e}")))?;

        match res.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            s if s.is_success() => {
                let body = res
                    .json::<T>()
                    .await
                    .map_err(|e| VoteWireError::Api(format!("GET {path}: invalid body: {e}")))?;
                Ok(Some(body))
            }
            s => {
                let body = res.text().await.unwrap_or_default();
                Err(VoteWireError::Api(format!(
                    "GET {path}: status {s} body={body}"
                )))
            }
        }
    }
}

#[async_trait]
impl MeetingApi for HttpMeetingApi {
    async fn ongoing_meeting(&self) -> Result<Option<MeetingRef>> {
        self.get_json("/api/meetings/ongoing").await
    }

    async fn realtime_status(&self, meeting_id: &str) -> Result<MeetingSnapshot> {
        self.get_json(&format!("/api/meetings/{meeting_id}/realtime"))
            .await?
            .ok_or_else(|| {
                VoteWireError::Api(format!("no realtime status for meeting {meeting_id}"))
            })
    }
}
