//! STOMP 1.2 frame codec (panic-free).
//!
//! Parsing rules:
//! - Never index raw text; all slicing goes through checked splits.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.
//!
//! One WebSocket text message carries exactly one frame. A bare EOL is a
//! heartbeat and decodes to `Ok(None)`.

use crate::error::{Result, VoteWireError};

/// STOMP commands used on the result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // client -> server
    Connect,
    Subscribe,
    Unsubscribe,
    Disconnect,
    // server -> client
    Connected,
    Message,
    Error,
    Receipt,
}

impl Command {
    /// Command line as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Error => "ERROR",
            Command::Receipt => "RECEIPT",
        }
    }

    fn parse(s: &str) -> Option<Command> {
        match s {
            "CONNECT" => Some(Command::Connect),
            "SUBSCRIBE" => Some(Command::Subscribe),
            "UNSUBSCRIBE" => Some(Command::Unsubscribe),
            "DISCONNECT" => Some(Command::Disconnect),
            "CONNECTED" => Some(Command::Connected),
            "MESSAGE" => Some(Command::Message),
            "ERROR" => Some(Command::Error),
            "RECEIPT" => Some(Command::Receipt),
            _ => None,
        }
    }
}

/// A single decoded STOMP frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub command: Command,
    /// Header pairs in wire order. Repeated names are kept; `header()`
    /// returns the first occurrence, per STOMP 1.2.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First-match header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Encode a frame as a NUL-terminated text message.
pub fn encode(frame: &Frame) -> String {
    let escape = escaping_applies(frame.command);
    let mut out = String::with_capacity(frame.body.len() + 64);
    out.push_str(frame.command.as_str());
    out.push('\n');
    for (name, value) in &frame.headers {
        if escape {
            out.push_str(&escape_header(name));
            out.push(':');
            out.push_str(&escape_header(value));
        } else {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
        }
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&frame.body);
    out.push('\0');
    out
}

/// Decode one frame from a text message.
///
/// Returns `Ok(None)` for heartbeat frames (a bare EOL). A trailing NUL
/// terminator is tolerated and stripped.
pub fn decode(raw: &str) -> Result<Option<Frame>> {
    let raw = raw.strip_suffix('\0').unwrap_or(raw);
    if raw.is_empty() || raw == "\n" || raw == "\r\n" {
        return Ok(None);
    }

    let (head, body) = split_head(raw)?;
    let mut lines = head.lines();
    let command_line = lines
        .next()
        .map(strip_cr)
        .ok_or_else(|| VoteWireError::Protocol("empty frame".into()))?;
    let command = Command::parse(command_line)
        .ok_or_else(|| VoteWireError::Protocol(format!("unknown command: {command_line}")))?;

    let escape = escaping_applies(command);
    let mut headers = Vec::new();
    for line in lines {
        let line = strip_cr(line);
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| VoteWireError::Protocol(format!("malformed header line: {line}")))?;
        if escape {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    Ok(Some(Frame {
        command,
        headers,
        body: body.to_string(),
    }))
}

/// Negotiate the outgoing heartbeat interval against the server's
/// `heart-beat` header (`sx,sy` where `sy` is what the server wants to
/// receive). Returns `None` when either side disables heartbeats.
pub fn negotiate_heartbeat(client_ms: u64, server_header: Option<&str>) -> Option<u64> {
    let header = server_header?;
    let (_, want) = header.split_once(',')?;
    let want: u64 = want.trim().parse().ok()?;
    if client_ms == 0 || want == 0 {
        return None;
    }
    Some(client_ms.max(want))
}

// Headers end at the first blank line; body is everything after it.
fn split_head(raw: &str) -> Result<(&str, &str)> {
    let lf = raw.find("\n\n");
    let crlf = raw.find("\r\n\r\n");
    match (lf, crlf) {
        (Some(i), Some(j)) if j < i => Ok((&raw[..j], &raw[j + 4..])),
        (Some(i), _) => Ok((&raw[..i], &raw[i + 2..])),
        (None, Some(j)) => Ok((&raw[..j], &raw[j + 4..])),
        (None, None) => Err(VoteWireError::Protocol("missing header terminator".into())),
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

// STOMP 1.2: header octets are escaped on every frame except
// CONNECT/CONNECTED.
fn escaping_applies(command: Command) -> bool {
    !matches!(command, Command::Connect | Command::Connected)
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some(other) => {
                return Err(VoteWireError::Protocol(format!(
                    "invalid header escape: \\{other}"
                )))
            }
            None => {
                return Err(VoteWireError::Protocol(
                    "dangling escape at end of header".into(),
                ))
            }
        }
    }
    Ok(out)
}
