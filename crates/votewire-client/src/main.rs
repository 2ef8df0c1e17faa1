//! votewire watcher
//!
//! Console subscriber for a meeting's live results:
//! - resolves the ongoing meeting, or takes an explicit id as argv[1]
//! - subscribes via STOMP over WebSocket and logs tally updates
//! - Ctrl-C tears the subscription down

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use votewire_client::api::HttpMeetingApi;
use votewire_client::auth::{StaticTokenProvider, TokenProvider};
use votewire_client::config;
use votewire_client::realtime::SnapshotProvider;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("VOTEWIRE_CONFIG").unwrap_or_else(|_| "votewire.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let tokens: Arc<dyn TokenProvider> = match std::env::var("VOTEWIRE_TOKEN") {
        Ok(t) if !t.is_empty() => Arc::new(StaticTokenProvider::new(t)),
        _ => Arc::new(StaticTokenProvider::anonymous()),
    };
    let api = Arc::new(
        HttpMeetingApi::new(&cfg.api, Arc::clone(&tokens)).expect("http client build failed"),
    );
    let meeting = std::env::args().nth(1);

    tracing::info!(config = %path, "votewire watcher starting");
    let handle = SnapshotProvider::spawn(&cfg, api, tokens, meeting);
    let mut status = handle.status_watch();
    let mut snapshot = handle.snapshot_watch();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            res = status.changed() => {
                if res.is_err() {
                    break;
                }
                let s = status.borrow_and_update().clone();
                tracing::info!(
                    phase = ?s.phase,
                    meeting = ?s.active_meeting_id,
                    error = ?s.last_error,
                    "connection status"
                );
            }

            res = snapshot.changed() => {
                if res.is_err() {
                    break;
                }
                let snap = snapshot.borrow_and_update().clone();
                let Some(snap) = snap else { continue };
                for r in &snap.resolution_results {
                    tracing::info!(
                        meeting = %snap.meeting_id,
                        resolution = %r.resolution_id,
                        voters = r.total_voters,
                        weight = r.total_weight,
                        "resolution tally"
                    );
                }
                for e in &snap.election_results {
                    tracing::info!(
                        meeting = %snap.meeting_id,
                        election = %e.election_id,
                        voters = e.total_voters,
                        weight = e.total_weight,
                        "election tally"
                    );
                }
            }
        }
    }

    tracing::info!("shutting down");
    handle.shutdown().await;
}
