// File: handpilot-core/src/stabilizer.rs
//
// Turns the noisy per-frame gesture stream into discrete events, so a hand
// held in one pose for many frames produces one command instead of a flood.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use handpilot_common::models::{EventSource, Gesture, GestureEvent};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Consecutive `None` frames after which the last emitted gesture is
    /// forgotten and may fire again. `0` emits on every non-`None` frame.
    pub silence_frames: u32,
    /// How long a gesture must be seen without interruption before it is
    /// emitted. `0` disables the hold.
    pub hold_ms: u64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            silence_frames: 5,
            hold_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureStabilizer {
    config: StabilizerConfig,
    source: EventSource,
    last_emitted: Gesture,
    none_streak: u32,
    /// Gesture currently being held and when it was first seen.
    candidate: Option<(Gesture, DateTime<Utc>)>,
}

impl GestureStabilizer {
    pub fn new(config: StabilizerConfig, source: EventSource) -> Self {
        Self {
            config,
            source,
            last_emitted: Gesture::None,
            none_streak: 0,
            candidate: None,
        }
    }

    pub fn last_emitted(&self) -> Gesture {
        self.last_emitted
    }

    pub fn observe(&mut self, gesture: Gesture, timestamp: DateTime<Utc>) -> Option<GestureEvent> {
        if gesture.is_none() {
            self.candidate = None;
            self.none_streak = self.none_streak.saturating_add(1);
            if self.config.silence_frames > 0
                && self.none_streak >= self.config.silence_frames
                && !self.last_emitted.is_none()
            {
                debug!("{} silent frames, forgetting {}", self.none_streak, self.last_emitted);
                self.last_emitted = Gesture::None;
            }
            return None;
        }
        self.none_streak = 0;

        let since = match self.candidate {
            Some((held, since)) if held == gesture => since,
            _ => {
                self.candidate = Some((gesture, timestamp));
                timestamp
            }
        };
        if timestamp - since < self.hold() {
            return None;
        }

        if self.config.silence_frames == 0 || gesture != self.last_emitted {
            self.last_emitted = gesture;
            return Some(GestureEvent {
                gesture,
                source: self.source,
                timestamp,
            });
        }
        None
    }

    fn hold(&self) -> Duration {
        Duration::milliseconds(self.config.hold_ms.min(u32::MAX as u64) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
    }

    fn feed(stab: &mut GestureStabilizer, frames: &[Gesture]) -> Vec<Gesture> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(i, g)| stab.observe(*g, at(i as i64 * 33)))
            .map(|e| e.gesture)
            .collect()
    }

    #[test]
    fn test_held_gesture_emits_once() {
        let mut stab = GestureStabilizer::new(StabilizerConfig::default(), EventSource::Camera);
        let out = feed(&mut stab, &[Gesture::Palm; 30]);
        assert_eq!(out, vec![Gesture::Palm]);
    }

    #[test]
    fn test_short_dropout_does_not_retrigger() {
        let mut stab = GestureStabilizer::new(
            StabilizerConfig { silence_frames: 3, hold_ms: 0 },
            EventSource::Camera,
        );
        use Gesture::*;
        let out = feed(&mut stab, &[Palm, Palm, None, None, Palm, Palm]);
        assert_eq!(out, vec![Palm]);
    }

    #[test]
    fn test_silence_window_rearms_same_gesture() {
        let mut stab = GestureStabilizer::new(
            StabilizerConfig { silence_frames: 3, hold_ms: 0 },
            EventSource::Camera,
        );
        use Gesture::*;
        let out = feed(&mut stab, &[Palm, None, None, None, Palm]);
        assert_eq!(out, vec![Palm, Palm]);
        assert_eq!(stab.last_emitted(), Palm);
    }

    #[test]
    fn test_gesture_change_emits() {
        let mut stab = GestureStabilizer::new(StabilizerConfig::default(), EventSource::Camera);
        use Gesture::*;
        let out = feed(&mut stab, &[Palm, Palm, Two, Two, Palm]);
        assert_eq!(out, vec![Palm, Two, Palm]);
    }

    #[test]
    fn test_parity_mode_emits_every_frame() {
        let mut stab = GestureStabilizer::new(
            StabilizerConfig { silence_frames: 0, hold_ms: 0 },
            EventSource::Camera,
        );
        use Gesture::*;
        let out = feed(&mut stab, &[One, One, None, One]);
        assert_eq!(out, vec![One, One, One]);
    }

    #[test]
    fn test_hold_requires_stable_pose() {
        let mut stab = GestureStabilizer::new(
            StabilizerConfig { silence_frames: 5, hold_ms: 800 },
            EventSource::Camera,
        );
        assert!(stab.observe(Gesture::Palm, at(0)).is_none());
        assert!(stab.observe(Gesture::Palm, at(500)).is_none());
        // a flicker to another pose restarts the timer
        assert!(stab.observe(Gesture::Two, at(600)).is_none());
        assert!(stab.observe(Gesture::Palm, at(700)).is_none());
        assert!(stab.observe(Gesture::Palm, at(1400)).is_none());
        let evt = stab.observe(Gesture::Palm, at(1500)).expect("held for 800ms");
        assert_eq!(evt.gesture, Gesture::Palm);
        assert_eq!(evt.source, EventSource::Camera);
        assert_eq!(evt.timestamp, at(1500));
        assert!(stab.observe(Gesture::Palm, at(3000)).is_none());
    }

    #[test]
    fn test_none_never_emits() {
        let mut stab = GestureStabilizer::new(StabilizerConfig::default(), EventSource::Camera);
        assert!(feed(&mut stab, &[Gesture::None; 10]).is_empty());
    }
}
