// File: handpilot-common/src/models/mod.rs
pub mod gesture;
pub mod vehicle;
pub mod frame;
pub mod telemetry;

pub use gesture::{EventSource, Gesture, GestureEvent};
pub use vehicle::{Command, Completion, Direction, IssuedCommand, VehicleState};
pub use frame::Frame;
pub use telemetry::{find_altitude, TelemetrySample, ALTITUDE_SAMPLE};
