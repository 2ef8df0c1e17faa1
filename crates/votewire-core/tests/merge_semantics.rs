//! Field-wise merge semantics tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use votewire_core::protocol::snapshot::{
    merge, MeetingSnapshot, OptionTally, ResolutionResult, SnapshotUpdate,
};

// Baseline as the initial REST fetch would return it: one empty resolution
// tally, no election tallies.
fn baseline() -> MeetingSnapshot {
    MeetingSnapshot {
        meeting_id: "M1".into(),
        resolution_results: vec![ResolutionResult {
            resolution_id: "R1".into(),
            results: vec![],
            total_voters: 0,
            total_weight: 0.0,
        }],
        election_results: vec![],
    }
}

fn r1_delta() -> SnapshotUpdate {
    SnapshotUpdate {
        meeting_id: None,
        resolution_results: Some(vec![ResolutionResult {
            resolution_id: "R1".into(),
            results: vec![OptionTally {
                voting_option_id: "yes".into(),
                vote_count: 5,
                vote_weight: 500.0,
                percentage: 100.0,
            }],
            total_voters: 5,
            total_weight: 500.0,
        }]),
        election_results: None,
    }
}

#[test]
fn seeds_from_update_when_no_previous() {
    let full = SnapshotUpdate {
        meeting_id: Some("M1".into()),
        ..r1_delta()
    };
    let merged = merge(None, &full).unwrap();
    assert_eq!(merged.meeting_id, "M1");
    assert_eq!(merged.resolution_results, full.resolution_results.unwrap());
    assert!(merged.election_results.is_empty());
}

#[test]
fn seeding_requires_a_meeting_id() {
    let err = merge(None, &r1_delta()).unwrap_err();
    assert_eq!(err.kind(), "PROTOCOL");
}

#[test]
fn omitted_fields_are_retained() {
    // delta touches resolutionResults only; electionResults must survive
    let merged = merge(Some(&baseline()), &r1_delta()).unwrap();
    assert_eq!(merged.meeting_id, "M1");
    assert_eq!(merged.election_results, baseline().election_results);
    assert_eq!(merged.resolution_results[0].total_voters, 5);
    assert_eq!(merged.resolution_results[0].results[0].vote_count, 5);
}

#[test]
fn present_fields_replace_wholesale() {
    let mut prev = baseline();
    prev.resolution_results.push(ResolutionResult {
        resolution_id: "R2".into(),
        ..Default::default()
    });
    // update carries R1 only; R2 must not linger after the replace
    let merged = merge(Some(&prev), &r1_delta()).unwrap();
    assert_eq!(merged.resolution_results.len(), 1);
    assert_eq!(merged.resolution_results[0].resolution_id, "R1");
}

#[test]
fn full_update_is_idempotent() {
    let full: SnapshotUpdate = MeetingSnapshot {
        meeting_id: "M1".into(),
        resolution_results: r1_delta().resolution_results.unwrap(),
        election_results: vec![],
    }
    .into();
    let once = merge(Some(&baseline()), &full).unwrap();
    let twice = merge(Some(&once), &full).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn cross_meeting_update_is_rejected() {
    let foreign = SnapshotUpdate {
        meeting_id: Some("M9".into()),
        ..r1_delta()
    };
    let err = merge(Some(&baseline()), &foreign).unwrap_err();
    assert_eq!(err.kind(), "PROTOCOL");
    assert!(err.to_string().contains("cross-meeting"));
}

#[test]
fn empty_seed_then_delta() {
    let seed = MeetingSnapshot::empty("M1");
    assert!(seed.resolution_results.is_empty());
    let merged = merge(Some(&seed), &r1_delta()).unwrap();
    assert_eq!(merged.resolution_results[0].total_voters, 5);
}
