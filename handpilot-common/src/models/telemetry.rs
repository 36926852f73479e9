// File: handpilot-common/src/models/telemetry.rs

use serde::{Deserialize, Serialize};

/// Name of the altitude sample in the telemetry feed.
pub const ALTITUDE_SAMPLE: &str = "Alt";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TelemetrySample {
    pub name: String,
    pub value: f32,
}

impl TelemetrySample {
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Returns the first `Alt` sample in a telemetry batch.
pub fn find_altitude(samples: &[TelemetrySample]) -> Option<f32> {
    samples
        .iter()
        .find(|s| s.name == ALTITUDE_SAMPLE)
        .map(|s| s.value)
}
