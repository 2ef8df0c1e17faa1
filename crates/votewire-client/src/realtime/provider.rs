//! Snapshot provider: the composition root over the connection manager.
//!
//! Owns the current `MeetingSnapshot`, merges accepted envelopes into it,
//! and performs the initial REST fetch whenever the (generation, meeting)
//! pair changes so consumers never wait for the first push. This layer
//! has no protocol knowledge; it only sequences the manager, the
//! normalizer output, and the merge.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use votewire_core::protocol::envelope::{EnvelopeKind, RealtimeEnvelope};
use votewire_core::protocol::snapshot::{merge, MeetingSnapshot, SnapshotUpdate};

use crate::api::MeetingApi;
use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use crate::realtime::connection::{
    Command, ConnectionHandle, ConnectionManager, ConnectionStatus,
};

enum ProviderCommand {
    Refresh,
    Shutdown,
}

/// Handle exposed to the host application. `realtime_status()` values are
/// read-only views; consumers re-render on watch changes.
pub struct ProviderHandle {
    status: watch::Receiver<ConnectionStatus>,
    snapshot: watch::Receiver<Option<MeetingSnapshot>>,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    task: JoinHandle<()>,
}

impl ProviderHandle {
    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    pub fn error(&self) -> Option<String> {
        self.status.borrow().last_error.clone()
    }

    pub fn active_meeting_id(&self) -> Option<String> {
        self.status.borrow().active_meeting_id.clone()
    }

    /// Current merged snapshot, if any meeting is active.
    pub fn realtime_status(&self) -> Option<MeetingSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Watch channel for connection-state changes.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Watch channel for snapshot changes.
    pub fn snapshot_watch(&self) -> watch::Receiver<Option<MeetingSnapshot>> {
        self.snapshot.clone()
    }

    /// Tear down and re-establish the connection, re-resolving the
    /// meeting and re-fetching the snapshot.
    pub fn refresh_connection(&self) {
        let _ = self.cmd_tx.try_send(ProviderCommand::Refresh);
    }

    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(ProviderCommand::Shutdown).await;
        let _ = self.task.await;
    }
}

pub struct SnapshotProvider;

impl SnapshotProvider {
    /// Spawn the provider over a fresh connection manager. With
    /// `meeting_id` set, that meeting is watched directly; otherwise the
    /// ongoing meeting is resolved via REST.
    pub fn spawn(
        cfg: &ClientConfig,
        api: Arc<dyn MeetingApi>,
        tokens: Arc<dyn TokenProvider>,
        meeting_id: Option<String>,
    ) -> ProviderHandle {
        let conn = ConnectionManager::spawn(
            cfg.realtime.clone(),
            Arc::clone(&api),
            tokens,
            meeting_id,
        );
        let status_rx = conn.status_watch();
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let task = tokio::spawn(run(conn, api, snapshot_tx, cmd_rx));

        ProviderHandle {
            status: status_rx,
            snapshot: snapshot_rx,
            cmd_tx,
            task,
        }
    }
}

async fn run(
    conn: ConnectionHandle,
    api: Arc<dyn MeetingApi>,
    snapshot_tx: watch::Sender<Option<MeetingSnapshot>>,
    mut cmd_rx: mpsc::Receiver<ProviderCommand>,
) {
    let ConnectionHandle {
        status: mut status_rx,
        envelopes: mut envelope_rx,
        cmd_tx: conn_cmd,
        task: conn_task,
    } = conn;

    // (generation, meeting) the last initial fetch was issued for
    let mut fetched_for: Option<(u64, String)> = None;

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(ProviderCommand::Refresh) => {
                    fetched_for = None;
                    let _ = conn_cmd.try_send(Command::Reconnect);
                }
                Some(ProviderCommand::Shutdown) | None => break,
            },

            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let (generation, meeting) = {
                    let s = status_rx.borrow_and_update();
                    (s.generation, s.active_meeting_id.clone())
                };

                let Some(meeting) = meeting else {
                    // no active meeting: drop any stale view
                    if snapshot_tx.borrow().is_some() {
                        let _ = snapshot_tx.send(None);
                    }
                    continue;
                };

                // switching meetings discards the previous view
                let stale = snapshot_tx
                    .borrow()
                    .as_ref()
                    .map(|s| s.meeting_id != meeting)
                    .unwrap_or(false);
                if stale {
                    let _ = snapshot_tx.send(None);
                }

                if fetched_for.as_ref() != Some(&(generation, meeting.clone())) {
                    fetched_for = Some((generation, meeting.clone()));
                    match api.realtime_status(&meeting).await {
                        Ok(full) => {
                            // discard if a newer generation or meeting won
                            // while the fetch was in flight
                            let current = status_rx.borrow().clone();
                            if current.generation == generation
                                && current.active_meeting_id.as_deref() == Some(meeting.as_str())
                            {
                                apply_update(&snapshot_tx, &meeting, &SnapshotUpdate::from(full));
                            } else {
                                tracing::debug!(meeting = %meeting, "stale initial fetch discarded");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(meeting = %meeting, error = %e, "initial snapshot fetch failed, waiting for pushes");
                        }
                    }
                }
            },

            env = envelope_rx.recv() => {
                let Some(env) = env else { break; };
                handle_envelope(&snapshot_tx, &status_rx, env);
            }
        }
    }

    let _ = conn_cmd.send(Command::Shutdown).await;
    let _ = conn_task.await;
}

fn handle_envelope(
    snapshot_tx: &watch::Sender<Option<MeetingSnapshot>>,
    status_rx: &watch::Receiver<ConnectionStatus>,
    env: RealtimeEnvelope,
) {
    if env.kind == EnvelopeKind::Error {
        // carries no usable payload; the existing snapshot stays valid
        tracing::warn!("error envelope received, keeping current snapshot");
        return;
    }

    let Some(expected) = status_rx.borrow().active_meeting_id.clone() else {
        tracing::warn!("envelope arrived with no active meeting, dropped");
        return;
    };

    if let Some(id) = &env.meeting_id {
        if id != &expected {
            tracing::warn!(expected = %expected, got = %id, "cross-meeting envelope dropped");
            return;
        }
    }

    apply_update(snapshot_tx, &expected, &env.payload);
}

fn apply_update(
    snapshot_tx: &watch::Sender<Option<MeetingSnapshot>>,
    meeting_id: &str,
    update: &SnapshotUpdate,
) {
    // seed an empty view so deltas arriving before the initial fetch
    // completes still apply
    let prev = match snapshot_tx.borrow().clone() {
        Some(s) if s.meeting_id == meeting_id => s,
        _ => MeetingSnapshot::empty(meeting_id),
    };

    match merge(Some(&prev), update) {
        Ok(next) => {
            let _ = snapshot_tx.send(Some(next));
        }
        Err(e) => {
            tracing::warn!(meeting = %meeting_id, error = %e, "update rejected");
        }
    }
}
