// File: handpilot-common/src/models/vehicle.rs

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::models::gesture::{EventSource, Gesture};

/// Flight state as tracked by the dispatcher.
///
/// Transitions form a strict cycle:
/// `Grounded -> TakingOff -> Airborne -> Landing -> Grounded`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    #[default]
    Grounded,
    TakingOff,
    Airborne,
    Landing,
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleState::Grounded => write!(f, "grounded"),
            VehicleState::TakingOff => write!(f, "taking_off"),
            VehicleState::Airborne => write!(f, "airborne"),
            VehicleState::Landing => write!(f, "landing"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "Forward"),
            Direction::Back => write!(f, "Back"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
        }
    }
}

/// A command for the vehicle control facade.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Command {
    Connect { target: String },
    Takeoff { altitude: f32 },
    Land,
    SetHeading { degrees: f32 },
    Move { direction: Direction, distance: f32 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Connect { .. } => "connect",
            Command::Takeoff { .. } => "takeoff",
            Command::Land => "land",
            Command::SetHeading { .. } => "set_heading",
            Command::Move { .. } => "move",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect { target } => write!(f, "connect({})", target),
            Command::Takeoff { altitude } => write!(f, "takeoff({})", altitude),
            Command::Land => write!(f, "land"),
            Command::SetHeading { degrees } => write!(f, "set_heading({})", degrees),
            Command::Move { direction, distance } => write!(f, "move({}, {})", direction, distance),
        }
    }
}

/// A command as it left the dispatcher, tagged with where it came from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IssuedCommand {
    pub id: u64,
    pub command: Command,
    pub gesture: Gesture,
    pub source: EventSource,
    /// Always false: the dispatcher never waits on the vehicle.
    pub blocking: bool,
}

/// Result payload delivered to a completion callback.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Completion {
    pub vehicle_id: u8,
    pub success: bool,
    pub status: Option<String>,
}

impl Completion {
    pub fn succeeded(vehicle_id: u8, status: impl Into<String>) -> Self {
        Self {
            vehicle_id,
            success: true,
            status: Some(status.into()),
        }
    }

    pub fn failed(vehicle_id: u8, status: impl Into<String>) -> Self {
        Self {
            vehicle_id,
            success: false,
            status: Some(status.into()),
        }
    }
}
