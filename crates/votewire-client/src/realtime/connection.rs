//! Connection manager: owns exactly one logical subscription at a time.
//!
//! Lifecycle: Idle -> Resolving -> Connecting -> Connected, with Errored
//! holding the last failure. Transport drops retry automatically after a
//! fixed delay without touching `generation`; a manual reconnect tears the
//! current attempt down unconditionally, bumps `generation`, and restarts
//! from Resolving. Every suspension point races the command channel, so a
//! completion from a previous generation can never clobber newer state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, timeout, Instant, MissedTickBehavior};

use votewire_core::error::VoteWireError;
use votewire_core::protocol::envelope::{normalize, RealtimeEnvelope};

use crate::api::MeetingApi;
use crate::auth::TokenProvider;
use crate::config::RealtimeSection;
use crate::transport::session::{ServerEvent, StompSession};

/// Topic carrying one meeting's result stream.
pub fn meeting_topic(meeting_id: &str) -> String {
    format!("/topic/meeting/{meeting_id}")
}

const LIVENESS_CHECK: Duration = Duration::from_millis(250);

/// Lifecycle phase of the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No meeting to watch (none ongoing, or realtime disabled).
    Idle,
    /// Looking up the ongoing meeting.
    Resolving,
    /// Transport + STOMP handshake in flight.
    Connecting,
    /// Subscription active.
    Connected,
    /// Holding the last failure; automatic retry or manual refresh pending.
    Errored,
}

/// Observable state of the subscription.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub phase: ConnectionPhase,
    /// Last failure reason; cleared on successful connect.
    pub last_error: Option<String>,
    /// The meeting actually subscribed to. May differ from a caller's
    /// request when resolution via the ongoing-meeting lookup was needed.
    pub active_meeting_id: Option<String>,
    /// Bumped on every manual reconnect. Stale in-flight work from an
    /// older generation is discarded, never applied.
    pub generation: u64,
}

impl ConnectionStatus {
    fn initial() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            last_error: None,
            active_meeting_id: None,
            generation: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    Reconnect,
    Shutdown,
}

/// Handle to a running connection task.
pub struct ConnectionHandle {
    pub(crate) status: watch::Receiver<ConnectionStatus>,
    pub(crate) envelopes: mpsc::Receiver<RealtimeEnvelope>,
    pub(crate) cmd_tx: mpsc::Sender<Command>,
    pub(crate) task: tokio::task::JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Tear down the current transport and restart from Resolving.
    pub fn reconnect(&self) {
        let _ = self.cmd_tx.try_send(Command::Reconnect);
    }

    /// Full teardown: unsubscribe + disconnect, then the task exits.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
        let _ = self.task.await;
    }
}

pub struct ConnectionManager;

impl ConnectionManager {
    /// Spawn the connection task. With `requested_meeting` set the lookup
    /// step is skipped and that meeting is watched directly.
    pub fn spawn(
        cfg: RealtimeSection,
        api: Arc<dyn MeetingApi>,
        tokens: Arc<dyn TokenProvider>,
        requested_meeting: Option<String>,
    ) -> ConnectionHandle {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::initial());
        let (envelope_tx, envelope_rx) = mpsc::channel(256);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let task = tokio::spawn(run(
            cfg,
            api,
            tokens,
            requested_meeting,
            status_tx,
            envelope_tx,
            cmd_rx,
        ));

        ConnectionHandle {
            status: status_rx,
            envelopes: envelope_rx,
            cmd_tx,
            task,
        }
    }
}

enum Race<T> {
    Done(T),
    Reconnect,
    Shutdown,
}

/// Race a future against the command channel. Commands win ties so a
/// manual reconnect always interrupts in-flight work.
async fn race_cmd<T>(
    cmd_rx: &mut mpsc::Receiver<Command>,
    fut: impl std::future::Future<Output = T>,
) -> Race<T> {
    tokio::pin!(fut);
    tokio::select! {
        biased;
        cmd = cmd_rx.recv() => match cmd {
            Some(Command::Reconnect) => Race::Reconnect,
            Some(Command::Shutdown) | None => Race::Shutdown,
        },
        out = &mut fut => Race::Done(out),
    }
}

enum SessionEnd {
    Manual,
    Shutdown,
    Dropped(VoteWireError),
}

async fn run(
    cfg: RealtimeSection,
    api: Arc<dyn MeetingApi>,
    tokens: Arc<dyn TokenProvider>,
    requested_meeting: Option<String>,
    status_tx: watch::Sender<ConnectionStatus>,
    envelope_tx: mpsc::Sender<RealtimeEnvelope>,
    mut cmd_rx: mpsc::Receiver<Command>,
) {
    let mut status = ConnectionStatus::initial();
    let retry_delay = Duration::from_millis(cfg.reconnect_delay_ms);

    if !cfg.enabled {
        tracing::info!("realtime disabled by configuration");
        while let Some(cmd) = cmd_rx.recv().await {
            if matches!(cmd, Command::Shutdown) {
                return;
            }
        }
        return;
    }

    'session: loop {
        // ---- Resolving
        status.phase = ConnectionPhase::Resolving;
        status.active_meeting_id = None;
        let _ = status_tx.send(status.clone());

        let meeting_id = match requested_meeting.clone() {
            Some(id) => id,
            None => {
                let lookup = {
                    let api = Arc::clone(&api);
                    async move { api.ongoing_meeting().await }
                };
                match race_cmd(&mut cmd_rx, lookup).await {
                    Race::Reconnect => {
                        status.generation += 1;
                        continue 'session;
                    }
                    Race::Shutdown => break 'session,
                    Race::Done(Ok(Some(meeting))) => meeting.id,
                    Race::Done(Ok(None)) => {
                        // nothing to show: a normal state, not a failure
                        status.phase = ConnectionPhase::Idle;
                        status.last_error = None;
                        let _ = status_tx.send(status.clone());
                        tracing::info!("no ongoing meeting, idling until refresh");
                        match cmd_rx.recv().await {
                            Some(Command::Reconnect) => {
                                status.generation += 1;
                                continue 'session;
                            }
                            Some(Command::Shutdown) | None => break 'session,
                        }
                    }
                    Race::Done(Err(e)) => {
                        let e = VoteWireError::Resolution(e.to_string());
                        tracing::warn!(error = %e, "meeting resolution failed");
                        fail(&mut status, &status_tx, &e);
                        // resolution failures are not retried automatically
                        match cmd_rx.recv().await {
                            Some(Command::Reconnect) => {
                                status.generation += 1;
                                continue 'session;
                            }
                            Some(Command::Shutdown) | None => break 'session,
                        }
                    }
                }
            }
        };

        status.active_meeting_id = Some(meeting_id.clone());

        // ---- Connecting, with automatic fixed-delay retry on drops
        'attempt: loop {
            status.phase = ConnectionPhase::Connecting;
            let _ = status_tx.send(status.clone());

            // token is re-read on every attempt; the auth subsystem owns
            // refresh and rotation
            let token = {
                let tokens = Arc::clone(&tokens);
                match race_cmd(&mut cmd_rx, async move { tokens.bearer_token().await }).await {
                    Race::Done(t) => t,
                    Race::Reconnect => {
                        status.generation += 1;
                        continue 'session;
                    }
                    Race::Shutdown => break 'session,
                }
            };
            if token.is_none() {
                tracing::warn!(meeting = %meeting_id, "no bearer token available, connecting unauthenticated");
            }

            let sub_id = format!("sub-{}", status.generation);
            let attempt = {
                let cfg = cfg.clone();
                let meeting_id = meeting_id.clone();
                let sub_id = sub_id.clone();
                let connect_timeout = Duration::from_millis(cfg.connect_timeout_ms);
                async move {
                    let mut session =
                        timeout(connect_timeout, StompSession::connect(&cfg, token.as_deref()))
                            .await
                            .map_err(|_| {
                                VoteWireError::Transport("connect timed out".into())
                            })??;
                    session
                        .subscribe(&sub_id, &meeting_topic(&meeting_id))
                        .await?;
                    Ok::<StompSession, VoteWireError>(session)
                }
            };

            let mut session = match race_cmd(&mut cmd_rx, attempt).await {
                Race::Reconnect => {
                    status.generation += 1;
                    continue 'session;
                }
                Race::Shutdown => break 'session,
                Race::Done(Ok(session)) => session,
                Race::Done(Err(e)) => {
                    tracing::warn!(meeting = %meeting_id, error = %e, "connect attempt failed");
                    fail(&mut status, &status_tx, &e);
                    match race_cmd(&mut cmd_rx, sleep(retry_delay)).await {
                        Race::Done(()) => continue 'attempt,
                        Race::Reconnect => {
                            status.generation += 1;
                            continue 'session;
                        }
                        Race::Shutdown => break 'session,
                    }
                }
            };

            // ---- Connected
            status.phase = ConnectionPhase::Connected;
            status.last_error = None;
            let _ = status_tx.send(status.clone());
            tracing::info!(meeting = %meeting_id, "subscribed to result stream");

            let mut heartbeat = session.heartbeat_interval().map(|d| {
                let mut t = interval(d);
                t.set_missed_tick_behavior(MissedTickBehavior::Delay);
                t
            });
            let idle_timeout = Duration::from_millis(cfg.idle_timeout_ms);
            let mut last_activity = Instant::now();

            let end = loop {
                tokio::select! {
                    biased;

                    cmd = cmd_rx.recv() => match cmd {
                        Some(Command::Reconnect) => break SessionEnd::Manual,
                        Some(Command::Shutdown) | None => break SessionEnd::Shutdown,
                    },

                    event = session.recv() => match event {
                        Ok(Some(ServerEvent::Message { body, .. })) => {
                            last_activity = Instant::now();
                            forward(&envelope_tx, &body).await;
                        }
                        Ok(Some(ServerEvent::Error { message })) => {
                            last_activity = Instant::now();
                            tracing::warn!(meeting = %meeting_id, error = %message, "server ERROR frame");
                            status.last_error = Some(message);
                            let _ = status_tx.send(status.clone());
                        }
                        Ok(Some(_)) => {
                            last_activity = Instant::now();
                        }
                        Ok(None) => break SessionEnd::Dropped(VoteWireError::Transport(
                            "connection closed by server".into(),
                        )),
                        Err(e) => break SessionEnd::Dropped(e),
                    },

                    _ = tick(heartbeat.as_mut()) => {
                        if let Err(e) = session.send_heartbeat().await {
                            break SessionEnd::Dropped(e);
                        }
                    }

                    _ = sleep(LIVENESS_CHECK) => {
                        if last_activity.elapsed() >= idle_timeout {
                            break SessionEnd::Dropped(VoteWireError::Transport(
                                "server silent past liveness window".into(),
                            ));
                        }
                    }
                }
            };

            match end {
                SessionEnd::Manual => {
                    let _ = session.unsubscribe(&sub_id).await;
                    session.disconnect().await;
                    status.generation += 1;
                    continue 'session;
                }
                SessionEnd::Shutdown => {
                    let _ = session.unsubscribe(&sub_id).await;
                    session.disconnect().await;
                    break 'session;
                }
                SessionEnd::Dropped(e) => {
                    tracing::warn!(meeting = %meeting_id, error = %e, "result stream dropped, retrying");
                    fail(&mut status, &status_tx, &e);
                    match race_cmd(&mut cmd_rx, sleep(retry_delay)).await {
                        Race::Done(()) => continue 'attempt,
                        Race::Reconnect => {
                            status.generation += 1;
                            continue 'session;
                        }
                        Race::Shutdown => break 'session,
                    }
                }
            }
        }
    }

    status.phase = ConnectionPhase::Idle;
    let _ = status_tx.send(status.clone());
    tracing::info!("realtime connection torn down");
}

fn fail(
    status: &mut ConnectionStatus,
    status_tx: &watch::Sender<ConnectionStatus>,
    err: &VoteWireError,
) {
    status.phase = ConnectionPhase::Errored;
    status.last_error = Some(err.to_string());
    let _ = status_tx.send(status.clone());
}

/// Parse and normalize one MESSAGE body. Unparseable bodies are dropped
/// here; ERROR-kind envelopes are forwarded so the provider decides how
/// to surface them.
async fn forward(envelope_tx: &mpsc::Sender<RealtimeEnvelope>, body: &str) {
    let value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable push body dropped");
            return;
        }
    };
    let env = normalize(Some(value));
    if envelope_tx.send(env).await.is_err() {
        tracing::debug!("envelope receiver gone");
    }
}

async fn tick(heartbeat: Option<&mut tokio::time::Interval>) {
    match heartbeat {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
