// File: handpilot-core/src/config.rs
//
// Top-level runtime configuration. Every section and field has a default,
// so an empty JSON object (or no file at all) is a valid config.

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::info;

use handpilot_common::Error;

use crate::channel::ChannelConfig;
use crate::dispatcher::DispatcherConfig;
use crate::stabilizer::StabilizerConfig;
use crate::vision::ClassifierConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PilotConfig {
    pub classifier: ClassifierConfig,
    pub stabilizer: StabilizerConfig,
    pub dispatcher: DispatcherConfig,
    pub channel: ChannelConfig,
}

impl PilotConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_json(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use handpilot_common::models::Direction;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_empty_object_gives_defaults() {
        let cfg = assert_ok!(PilotConfig::from_json("{}"));
        assert_eq!(cfg, PilotConfig::default());
        assert_eq!(cfg.channel.listen_addr, "127.0.0.1:5005");
        assert_eq!(cfg.classifier.min_area, 2000.0);
        assert_eq!(cfg.stabilizer.silence_frames, 5);
        assert_eq!(cfg.dispatcher.takeoff_altitude, 20.0);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "stabilizer": {{ "hold_ms": 800 }},
                "dispatcher": {{ "move_direction": "Up", "move_distance": 2.5 }},
                "classifier": {{ "skin": {{ "hue": [0, 25] }} }}
            }}"#
        )
        .unwrap();

        let cfg = assert_ok!(PilotConfig::load(file.path()));
        assert_eq!(cfg.stabilizer.hold_ms, 800);
        assert_eq!(cfg.stabilizer.silence_frames, 5);
        assert_eq!(cfg.dispatcher.move_direction, Direction::Up);
        assert_eq!(cfg.dispatcher.move_distance, 2.5);
        assert_eq!(cfg.dispatcher.left_heading, 270.0);
        assert_eq!(cfg.classifier.skin.hue, (0, 25));
        assert_eq!(cfg.classifier.skin.saturation, (30, 150));
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        assert!(matches!(PilotConfig::from_json("{ nope"), Err(Error::Config(_))));
        assert_err!(PilotConfig::from_json(r#"{ "stabilizer": { "hold_ms": -1 } }"#));
        assert!(matches!(
            PilotConfig::load("/definitely/not/here.json"),
            Err(Error::Config(_))
        ));
    }
}
