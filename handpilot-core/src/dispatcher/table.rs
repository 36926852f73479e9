// File: handpilot-core/src/dispatcher/table.rs
//
// The one gesture -> command table. Every ingress (camera, network, manual)
// goes through it.

use serde::{Deserialize, Serialize};

use handpilot_common::models::{Command, Direction, Gesture, VehicleState};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    pub takeoff_altitude: f32,
    pub move_direction: Direction,
    pub move_distance: f32,
    /// Heading commanded by `Two`.
    pub right_heading: f32,
    /// Heading commanded by `Three`.
    pub left_heading: f32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            takeoff_altitude: 20.0,
            move_direction: Direction::Forward,
            move_distance: 10.0,
            right_heading: 90.0,
            left_heading: 270.0,
        }
    }
}

/// A table row: the command for a gesture and the state it requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub command: Command,
    pub requires: VehicleState,
}

pub fn command_for(gesture: Gesture, config: &DispatcherConfig) -> Option<Mapping> {
    let (command, requires) = match gesture {
        Gesture::None => return None,
        Gesture::Palm => (
            Command::Takeoff { altitude: config.takeoff_altitude },
            VehicleState::Grounded,
        ),
        Gesture::Fist => (Command::Land, VehicleState::Airborne),
        Gesture::One => (
            Command::Move {
                direction: config.move_direction,
                distance: config.move_distance,
            },
            VehicleState::Airborne,
        ),
        Gesture::Two => (
            Command::SetHeading { degrees: config.right_heading },
            VehicleState::Airborne,
        ),
        Gesture::Three => (
            Command::SetHeading { degrees: config.left_heading },
            VehicleState::Airborne,
        ),
    };
    Some(Mapping { command, requires })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let cfg = DispatcherConfig::default();

        let palm = command_for(Gesture::Palm, &cfg).unwrap();
        assert_eq!(palm.command, Command::Takeoff { altitude: 20.0 });
        assert_eq!(palm.requires, VehicleState::Grounded);

        let fist = command_for(Gesture::Fist, &cfg).unwrap();
        assert_eq!(fist.command, Command::Land);
        assert_eq!(fist.requires, VehicleState::Airborne);

        let one = command_for(Gesture::One, &cfg).unwrap();
        assert_eq!(
            one.command,
            Command::Move { direction: Direction::Forward, distance: 10.0 }
        );

        assert_eq!(
            command_for(Gesture::Two, &cfg).unwrap().command,
            Command::SetHeading { degrees: 90.0 }
        );
        assert_eq!(
            command_for(Gesture::Three, &cfg).unwrap().command,
            Command::SetHeading { degrees: 270.0 }
        );

        assert!(command_for(Gesture::None, &cfg).is_none());
    }
}
