//! JSON test vector loader shared by the frame tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    /// Raw wire text of one frame.
    pub raw: String,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
    /// True when the raw text is a heartbeat (decodes to no frame).
    #[serde(default)]
    pub heartbeat: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub kind: String,
}
