#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use votewire_client::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
realtime:
  url: "ws://127.0.0.1:8080/api/ws"
  heartbeet_ms: 10000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert!(cfg.realtime.enabled);
    assert_eq!(cfg.realtime.heartbeat_ms, 10000);
    assert_eq!(cfg.api.request_timeout_ms, 5000);
}

#[test]
fn rejects_idle_timeout_below_heartbeat() {
    let bad = r#"
version: 1
realtime:
  heartbeat_ms: 10000
  idle_timeout_ms: 9000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("idle_timeout_ms"));
}

#[test]
fn rejects_non_websocket_url() {
    let bad = r#"
version: 1
realtime:
  url: "http://127.0.0.1:8080/api/ws"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), "CONFIG");
}

#[test]
fn rejects_unsupported_version() {
    let bad = r#"
version: 2
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("version"));
}
