//! STOMP frame vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use votewire_core::protocol::frame::{self, Command, Frame};

mod vector_loader;
use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn frame_vectors() {
    let files = [
        "frame_connected.json",
        "frame_message_crlf.json",
        "frame_heartbeat.json",
        "frame_unknown_command.json",
        "frame_missing_terminator.json",
        "frame_escaped_headers.json",
    ];

    for f in files {
        let v = load(f);
        let res = frame::decode(&v.raw);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.kind(), err.kind, "vector={}", v.description);
            continue;
        }

        let decoded = res.expect("expected ok decode");
        if v.heartbeat {
            assert!(decoded.is_none(), "vector={}", v.description);
            continue;
        }

        let fr = decoded.expect("expected a frame");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(
            fr.command.as_str(),
            ex["command"].as_str().unwrap(),
            "vector={}",
            v.description
        );
        let headers = ex["headers"].as_array().unwrap();
        assert_eq!(fr.headers.len(), headers.len(), "vector={}", v.description);
        for (i, h) in headers.iter().enumerate() {
            assert_eq!(fr.headers[i].0, h[0].as_str().unwrap(), "vector={}", v.description);
            assert_eq!(fr.headers[i].1, h[1].as_str().unwrap(), "vector={}", v.description);
        }
        assert_eq!(fr.body, ex["body"].as_str().unwrap(), "vector={}", v.description);
    }
}

#[test]
fn encode_decode_round_trip() {
    let sub = Frame::new(Command::Subscribe)
        .with_header("id", "sub-0")
        .with_header("destination", "/topic/meeting/M1");
    let decoded = frame::decode(&frame::encode(&sub)).unwrap().unwrap();
    assert_eq!(decoded.command, Command::Subscribe);
    assert_eq!(decoded.header("id"), Some("sub-0"));
    assert_eq!(decoded.header("destination"), Some("/topic/meeting/M1"));
    assert!(decoded.body.is_empty());
}

#[test]
fn header_escaping_round_trips_on_non_connect_frames() {
    let msg = Frame::new(Command::Message)
        .with_header("message", "colon: newline\nbackslash\\ done")
        .with_body("{}");
    let encoded = frame::encode(&msg);
    assert!(encoded.contains("\\c"));
    assert!(encoded.contains("\\n"));
    let decoded = frame::decode(&encoded).unwrap().unwrap();
    assert_eq!(decoded.header("message"), Some("colon: newline\nbackslash\\ done"));
}

#[test]
fn connect_headers_are_not_escaped() {
    let connect = Frame::new(Command::Connect).with_header("host", "meet:8080");
    let encoded = frame::encode(&connect);
    assert!(encoded.contains("host:meet:8080"));
}

#[test]
fn first_header_occurrence_wins() {
    let raw = "MESSAGE\ndestination:/topic/meeting/M1\ndestination:/topic/meeting/M2\n\n\u{0}";
    let fr = frame::decode(raw).unwrap().unwrap();
    assert_eq!(fr.header("destination"), Some("/topic/meeting/M1"));
}

#[test]
fn heartbeat_negotiation() {
    assert_eq!(frame::negotiate_heartbeat(10_000, Some("0,5000")), Some(10_000));
    assert_eq!(frame::negotiate_heartbeat(5_000, Some("0,20000")), Some(20_000));
    assert_eq!(frame::negotiate_heartbeat(10_000, Some("0,0")), None);
    assert_eq!(frame::negotiate_heartbeat(0, Some("0,5000")), None);
    assert_eq!(frame::negotiate_heartbeat(10_000, None), None);
    assert_eq!(frame::negotiate_heartbeat(10_000, Some("garbage")), None);
}
