//! Meeting snapshot types and the field-wise merge.
//!
//! The backend owns all counting; percentages and weights arrive
//! server-derived and are relayed untouched. Wire field names are
//! camelCase, matching the REST bodies.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoteWireError};

/// Per-option tally within a resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub voting_option_id: String,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub vote_weight: f64,
    #[serde(default)]
    pub percentage: f64,
}

/// Tally for one yes/no resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub resolution_id: String,
    #[serde(default)]
    pub results: Vec<OptionTally>,
    #[serde(default)]
    pub total_voters: u64,
    #[serde(default)]
    pub total_weight: f64,
}

/// Per-candidate tally within a board election.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    pub candidate_id: String,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub vote_weight: f64,
    #[serde(default)]
    pub percentage: f64,
}

/// Tally for one board-of-directors election.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResult {
    pub election_id: String,
    #[serde(default)]
    pub results: Vec<CandidateTally>,
    #[serde(default)]
    pub total_voters: u64,
    #[serde(default)]
    pub total_weight: f64,
}

/// The complete current view of one meeting's results, held in memory
/// only. `meeting_id` is immutable once the snapshot exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSnapshot {
    pub meeting_id: String,
    #[serde(default)]
    pub resolution_results: Vec<ResolutionResult>,
    #[serde(default)]
    pub election_results: Vec<ElectionResult>,
}

impl MeetingSnapshot {
    /// Seed an empty view for a meeting that just became active.
    pub fn empty(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            resolution_results: Vec::new(),
            election_results: Vec::new(),
        }
    }
}

/// Partial counterpart of `MeetingSnapshot`: a push may omit any field,
/// and an omitted field must never be read as "set to empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_results: Option<Vec<ResolutionResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub election_results: Option<Vec<ElectionResult>>,
}

impl From<MeetingSnapshot> for SnapshotUpdate {
    fn from(s: MeetingSnapshot) -> Self {
        Self {
            meeting_id: Some(s.meeting_id),
            resolution_results: Some(s.resolution_results),
            election_results: Some(s.election_results),
        }
    }
}

/// Field-wise merge of an update into the previous snapshot.
///
/// A field present on the update replaces the previous value wholesale
/// (the backend always sends a complete list for any field it includes);
/// an absent field is retained. This is "last applicable update wins per
/// field", not a CRDT merge; associativity is not guaranteed.
///
/// An update naming a different meeting than `prev` is rejected: merging
/// across meetings is a caller error, typically a stale subscription
/// racing a meeting switch.
pub fn merge(prev: Option<&MeetingSnapshot>, update: &SnapshotUpdate) -> Result<MeetingSnapshot> {
    match prev {
        None => {
            let meeting_id = update.meeting_id.clone().ok_or_else(|| {
                VoteWireError::Protocol("update without meeting id cannot seed a snapshot".into())
            })?;
            Ok(MeetingSnapshot {
                meeting_id,
                resolution_results: update.resolution_results.clone().unwrap_or_default(),
                election_results: update.election_results.clone().unwrap_or_default(),
            })
        }
        Some(prev) => {
            if let Some(id) = &update.meeting_id {
                if id != &prev.meeting_id {
                    return Err(VoteWireError::Protocol(format!(
                        "cross-meeting update rejected: snapshot {} got update for {id}",
                        prev.meeting_id
                    )));
                }
            }
            Ok(MeetingSnapshot {
                meeting_id: prev.meeting_id.clone(),
                resolution_results: update
                    .resolution_results
                    .clone()
                    .unwrap_or_else(|| prev.resolution_results.clone()),
                election_results: update
                    .election_results
                    .clone()
                    .unwrap_or_else(|| prev.election_results.clone()),
            })
        }
    }
}
