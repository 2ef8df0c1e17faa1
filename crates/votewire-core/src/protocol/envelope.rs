//! Push-message normalization.
//!
//! The backend has pushed result updates in several shapes over time:
//! tagged envelopes, bare `{data: ...}` wrappers, and naked snapshot
//! objects. This module is the single choke point that maps any decoded
//! body into one of a closed set of typed envelopes, so shape drift
//! upstream cannot reach the merge layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::snapshot::SnapshotUpdate;

/// Classification of a pushed frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeKind {
    /// Complete replacement of every field the payload carries.
    Full,
    /// Partial update; absent fields retain their previous value.
    Delta,
    /// Carries no usable payload; never merged.
    Error,
}

/// Canonical wrapper around one pushed update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEnvelope {
    pub kind: EnvelopeKind,
    pub payload: SnapshotUpdate,
    /// Producer-side emission time; synthesized as "now" when the source
    /// omitted it.
    pub timestamp: DateTime<Utc>,
    /// Correlation id, present when the backend attaches it redundantly
    /// to the envelope or payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
}

/// Normalize an arbitrary decoded body, stamping `Utc::now()` where the
/// source omitted a timestamp.
pub fn normalize(input: Option<Value>) -> RealtimeEnvelope {
    normalize_at(input, Utc::now())
}

/// Total normalization: every input maps to a well-formed envelope and
/// nothing here can panic or perform I/O. Unknown extra fields are
/// ignored: forward-compatibility over strictness.
///
/// Recognized shapes, in order:
/// 1. `kind`/`type` tag plus `payload`/`data` → passed through.
/// 2. `{data: X}` without a tag → FULL with payload `X`.
/// 3. Snapshot fields directly at the top level → FULL.
/// 4. Null, non-object, or unusable payload → ERROR with empty payload.
pub fn normalize_at(input: Option<Value>, now: DateTime<Utc>) -> RealtimeEnvelope {
    let Some(Value::Object(map)) = input else {
        tracing::debug!("unusable push body, classifying as ERROR");
        return error_envelope(now);
    };

    let tag = map
        .get("kind")
        .or_else(|| map.get("type"))
        .and_then(Value::as_str)
        .and_then(parse_kind);
    let timestamp = map.get("timestamp").and_then(parse_timestamp).unwrap_or(now);
    let meeting_id = map
        .get("meetingId")
        .and_then(Value::as_str)
        .map(str::to_owned);

    // shape 1: tagged envelope
    if let Some(kind) = tag {
        if kind == EnvelopeKind::Error {
            return RealtimeEnvelope {
                kind,
                payload: SnapshotUpdate::default(),
                timestamp,
                meeting_id,
            };
        }
        let payload = match map.get("payload").or_else(|| map.get("data")) {
            None | Some(Value::Null) => Some(SnapshotUpdate::default()),
            Some(raw) => parse_update(raw.clone()),
        };
        return match payload {
            Some(payload) => finish(kind, payload, timestamp, meeting_id),
            None => {
                tracing::debug!("tagged envelope with unusable payload, classifying as ERROR");
                error_envelope(timestamp)
            }
        };
    }

    // shape 2: data wrapper without a tag
    if let Some(raw) = map.get("data") {
        return match parse_update(raw.clone()) {
            Some(payload) => finish(EnvelopeKind::Full, payload, timestamp, meeting_id),
            None => {
                tracing::debug!("untagged data wrapper with unusable payload, classifying as ERROR");
                error_envelope(timestamp)
            }
        };
    }

    // shape 3: snapshot fields directly at the top level
    match parse_update(Value::Object(map)) {
        Some(payload) => finish(EnvelopeKind::Full, payload, timestamp, meeting_id),
        None => error_envelope(timestamp),
    }
}

fn finish(
    kind: EnvelopeKind,
    payload: SnapshotUpdate,
    timestamp: DateTime<Utc>,
    meeting_id: Option<String>,
) -> RealtimeEnvelope {
    // Canonicalize the correlation id onto the envelope.
    let meeting_id = meeting_id.or_else(|| payload.meeting_id.clone());
    RealtimeEnvelope {
        kind,
        payload,
        timestamp,
        meeting_id,
    }
}

fn error_envelope(timestamp: DateTime<Utc>) -> RealtimeEnvelope {
    RealtimeEnvelope {
        kind: EnvelopeKind::Error,
        payload: SnapshotUpdate::default(),
        timestamp,
        meeting_id: None,
    }
}

fn parse_kind(s: &str) -> Option<EnvelopeKind> {
    if s.eq_ignore_ascii_case("full") {
        Some(EnvelopeKind::Full)
    } else if s.eq_ignore_ascii_case("delta") {
        Some(EnvelopeKind::Delta)
    } else if s.eq_ignore_ascii_case("error") {
        Some(EnvelopeKind::Error)
    } else {
        None
    }
}

// Accepts RFC 3339 strings and epoch milliseconds.
fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms)),
        _ => None,
    }
}

fn parse_update(v: Value) -> Option<SnapshotUpdate> {
    serde_json::from_value(v).ok()
}
