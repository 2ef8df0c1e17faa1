use serde::Deserialize;
use votewire_core::error::{Result, VoteWireError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub realtime: RealtimeSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VoteWireError::Config("unsupported config version".into()));
        }

        self.api.validate()?;
        self.realtime.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ApiSection {
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(VoteWireError::Config(
                "api.base_url must start with http:// or https://".into(),
            ));
        }
        if !(500..=60000).contains(&self.request_timeout_ms) {
            return Err(VoteWireError::Config(
                "api.request_timeout_ms must be between 500 and 60000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_ws_url")]
    pub url: String,

    /// Outgoing heartbeat offer in ms; 0 disables heartbeats.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_ws_url(),
            heartbeat_ms: default_heartbeat_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl RealtimeSection {
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(VoteWireError::Config(
                "realtime.url must start with ws:// or wss://".into(),
            ));
        }
        if self.heartbeat_ms != 0 && !(1000..=120000).contains(&self.heartbeat_ms) {
            return Err(VoteWireError::Config(
                "realtime.heartbeat_ms must be 0 or between 1000 and 120000".into(),
            ));
        }
        if !(500..=60000).contains(&self.reconnect_delay_ms) {
            return Err(VoteWireError::Config(
                "realtime.reconnect_delay_ms must be between 500 and 60000".into(),
            ));
        }
        if !(1000..=60000).contains(&self.connect_timeout_ms) {
            return Err(VoteWireError::Config(
                "realtime.connect_timeout_ms must be between 1000 and 60000".into(),
            ));
        }
        if !(5000..=600000).contains(&self.idle_timeout_ms) {
            return Err(VoteWireError::Config(
                "realtime.idle_timeout_ms must be between 5000 and 600000".into(),
            ));
        }
        if self.heartbeat_ms != 0 && self.idle_timeout_ms <= self.heartbeat_ms {
            return Err(VoteWireError::Config(
                "realtime.idle_timeout_ms must be greater than heartbeat_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
fn default_base_url() -> String {
    "http://127.0.0.1:8080".into()
}
fn default_request_timeout_ms() -> u64 {
    5000
}
fn default_ws_url() -> String {
    "ws://127.0.0.1:8080/api/ws".into()
}
fn default_heartbeat_ms() -> u64 {
    10000
}
fn default_reconnect_delay_ms() -> u64 {
    5000
}
fn default_connect_timeout_ms() -> u64 {
    10000
}
fn default_idle_timeout_ms() -> u64 {
    30000
}
