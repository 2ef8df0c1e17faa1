//! STOMP session over a WebSocket (tokio-tungstenite).
//!
//! Responsibilities:
//! - open the socket and run the CONNECT/CONNECTED handshake
//! - SUBSCRIBE / UNSUBSCRIBE / DISCONNECT frames
//! - surface inbound frames as `ServerEvent`s; answer WS pings
//! - outgoing heartbeats at the interval negotiated on CONNECT
//!
//! A malformed frame is logged and skipped here: a single bad frame must
//! never tear down an otherwise-healthy stream.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use votewire_core::error::{Result, VoteWireError};
use votewire_core::protocol::frame::{self, Command, Frame};

use crate::config::RealtimeSection;

/// Inbound event at the STOMP level.
#[derive(Debug)]
pub enum ServerEvent {
    /// MESSAGE frame: destination + raw body text.
    Message {
        destination: Option<String>,
        body: String,
    },
    /// ERROR frame with its human-readable reason.
    Error { message: String },
    /// RECEIPT frame.
    Receipt { id: Option<String> },
    /// Server heartbeat or WS-level keepalive; resets liveness only.
    Keepalive,
}

pub struct StompSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    heartbeat: Option<Duration>,
}

impl StompSession {
    /// Open the socket and complete the STOMP handshake. The bearer
    /// token, when present, rides on the CONNECT frame; a missing token
    /// is the caller's concern, not a failure here.
    pub async fn connect(cfg: &RealtimeSection, token: Option<&str>) -> Result<Self> {
        let (mut ws, _) = connect_async(cfg.url.as_str())
            .await
            .map_err(|e| VoteWireError::Transport(format!("websocket connect: {e}")))?;

        let mut connect = Frame::new(Command::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", host_of(&cfg.url))
            .with_header(
                "heart-beat",
                &format!("{},{}", cfg.heartbeat_ms, cfg.heartbeat_ms),
            );
        if let Some(token) = token {
            connect = connect.with_header("Authorization", &format!("Bearer {token}"));
        }
        ws.send(Message::Text(frame::encode(&connect)))
            .await
            .map_err(|e| VoteWireError::Transport(format!("send CONNECT: {e}")))?;

        // The first real frame must be CONNECTED (or ERROR).
        loop {
            let msg = ws
                .next()
                .await
                .ok_or_else(|| VoteWireError::Transport("closed during handshake".into()))?
                .map_err(|e| VoteWireError::Transport(format!("handshake: {e}")))?;

            let text = match msg {
                Message::Text(t) => t,
                Message::Ping(p) => {
                    let _ = ws.send(Message::Pong(p)).await;
                    continue;
                }
                Message::Close(_) => {
                    return Err(VoteWireError::Transport("closed during handshake".into()))
                }
                _ => continue,
            };

            let Some(fr) = frame::decode(&text)? else {
                continue;
            };
            return match fr.command {
                Command::Connected => {
                    let heartbeat =
                        frame::negotiate_heartbeat(cfg.heartbeat_ms, fr.header("heart-beat"))
                            .map(Duration::from_millis);
                    Ok(Self { ws, heartbeat })
                }
                Command::Error => {
                    let reason = fr
                        .header("message")
                        .unwrap_or("handshake rejected")
                        .to_string();
                    Err(VoteWireError::Transport(reason))
                }
                other => Err(VoteWireError::Protocol(format!(
                    "unexpected {} during handshake",
                    other.as_str()
                ))),
            };
        }
    }

    /// Outgoing heartbeat interval negotiated with the server.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat
    }

    pub async fn subscribe(&mut self, id: &str, destination: &str) -> Result<()> {
        let fr = Frame::new(Command::Subscribe)
            .with_header("id", id)
            .with_header("destination", destination);
        self.send_frame(&fr).await
    }

    pub async fn unsubscribe(&mut self, id: &str) -> Result<()> {
        let fr = Frame::new(Command::Unsubscribe).with_header("id", id);
        self.send_frame(&fr).await
    }

    /// Best-effort graceful shutdown: DISCONNECT, then the WS close
    /// handshake. Errors are ignored; the peer may already be gone.
    pub async fn disconnect(mut self) {
        let fr = Frame::new(Command::Disconnect);
        let _ = self.ws.send(Message::Text(frame::encode(&fr))).await;
        let _ = self.ws.close(None).await;
    }

    pub async fn send_heartbeat(&mut self) -> Result<()> {
        self.ws
            .send(Message::Text("\n".into()))
            .await
            .map_err(|e| VoteWireError::Transport(format!("heartbeat send: {e}")))
    }

    async fn send_frame(&mut self, fr: &Frame) -> Result<()> {
        self.ws
            .send(Message::Text(frame::encode(fr)))
            .await
            .map_err(|e| {
                VoteWireError::Transport(format!("send {}: {e}", fr.command.as_str()))
            })
    }

    /// Next inbound event. `Ok(None)` means the peer closed.
    pub async fn recv(&mut self) -> Result<Option<ServerEvent>> {
        loop {
            let Some(msg) = self.ws.next().await else {
                return Ok(None);
            };
            let msg = msg.map_err(|e| VoteWireError::Transport(format!("receive: {e}")))?;

            match msg {
                Message::Text(text) => match frame::decode(&text) {
                    Ok(None) => return Ok(Some(ServerEvent::Keepalive)),
                    Ok(Some(fr)) => match fr.command {
                        Command::Message => {
                            return Ok(Some(ServerEvent::Message {
                                destination: fr.header("destination").map(str::to_owned),
                                body: fr.body,
                            }))
                        }
                        Command::Error => {
                            return Ok(Some(ServerEvent::Error {
                                message: fr
                                    .header("message")
                                    .unwrap_or("server error")
                                    .to_string(),
                            }))
                        }
                        Command::Receipt => {
                            return Ok(Some(ServerEvent::Receipt {
                                id: fr.header("receipt-id").map(str::to_owned),
                            }))
                        }
                        other => {
                            tracing::warn!(command = other.as_str(), "unexpected frame, ignoring");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed frame dropped");
                    }
                },
                Message::Ping(p) => {
                    let _ = self.ws.send(Message::Pong(p)).await;
                    return Ok(Some(ServerEvent::Keepalive));
                }
                Message::Pong(_) => return Ok(Some(ServerEvent::Keepalive)),
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
    }
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.split(['/', '?']).next().unwrap_or(rest)
}
