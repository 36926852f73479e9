// File: handpilot-common/src/models/gesture.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recognized hand pose. The vocabulary is closed; anything the
/// classifier cannot place is `None`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    #[default]
    None,
    Fist,
    One,
    Two,
    Three,
    Palm,
}

impl Gesture {
    /// Maps a count of finger valleys (convexity defects) onto a gesture.
    ///
    /// The count is the number of gaps between raised fingers, not the number
    /// of fingers, so "one" here means two fingers with one valley between
    /// them. That approximation is intentional and kept as-is.
    pub fn from_finger_valleys(valleys: usize) -> Self {
        match valleys {
            0 => Gesture::Fist,
            1 => Gesture::One,
            2 => Gesture::Two,
            3 => Gesture::Three,
            _ => Gesture::Palm,
        }
    }

    /// Translates a token from the remote detector's wire vocabulary
    /// (`palm`, `puño`, `uno`, `dos`, `tres`). Case-insensitive; surrounding
    /// whitespace is ignored. Returns `None` for anything else.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "palm" => Some(Gesture::Palm),
            "puño" => Some(Gesture::Fist),
            "uno" => Some(Gesture::One),
            "dos" => Some(Gesture::Two),
            "tres" => Some(Gesture::Three),
            _ => None,
        }
    }

    /// The wire token for this gesture, if it has one.
    pub fn wire_token(&self) -> Option<&'static str> {
        match self {
            Gesture::None => None,
            Gesture::Fist => Some("puño"),
            Gesture::One => Some("uno"),
            Gesture::Two => Some("dos"),
            Gesture::Three => Some("tres"),
            Gesture::Palm => Some("palm"),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Gesture::None)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::None => write!(f, "none"),
            Gesture::Fist => write!(f, "fist"),
            Gesture::One => write!(f, "one"),
            Gesture::Two => write!(f, "two"),
            Gesture::Three => write!(f, "three"),
            Gesture::Palm => write!(f, "palm"),
        }
    }
}

impl FromStr for Gesture {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Gesture::None),
            "fist" => Ok(Gesture::Fist),
            "one" => Ok(Gesture::One),
            "two" => Ok(Gesture::Two),
            "three" => Ok(Gesture::Three),
            "palm" => Ok(Gesture::Palm),
            _ => Err(format!("Unknown gesture: {}", s)),
        }
    }
}

/// Which ingress produced a gesture event.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Camera,
    Network,
    Manual,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Camera => write!(f, "camera"),
            EventSource::Network => write!(f, "network"),
            EventSource::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GestureEvent {
    pub gesture: Gesture,
    pub source: EventSource,
    pub timestamp: DateTime<Utc>,
}

impl GestureEvent {
    pub fn new(gesture: Gesture, source: EventSource) -> Self {
        Self {
            gesture,
            source,
            timestamp: Utc::now(),
        }
    }
}
