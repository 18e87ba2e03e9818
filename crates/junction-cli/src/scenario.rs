//! Recorded scenarios for `junction replay`.
//!
//! A scenario is a JSON document holding the stop-sign groupings of the map
//! and the frames of a drive, one per planning cycle:
//!
//! ```json
//! {
//!   "name": "four-way stop",
//!   "map": { "stop_signs": [ { "id": "1017", "lanes": ["9762", "868_1_-1"] } ] },
//!   "frames": [
//!     {
//!       "timestamp": 100.0,
//!       "ego": { "lane": "9762", "speed": 0.0 },
//!       "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.4 } ],
//!       "tracks": null
//!     }
//!   ]
//! }
//! ```
//!
//! `"tracks": null` (or a missing `tracks` field) replays a cycle in which
//! perception produced no snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use junction_rules::{StaticStopSignMap, StopSignGroup};
use junction_runtime::CycleFrame;
use junction_types::{EgoState, StopSignApproach, Timestamp, VehicleTrack};
use serde::Deserialize;
use thiserror::Error;

/// Scenario file could not be used.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scenario has no frames")]
    Empty,
    #[error("frame {index} timestamp {timestamp} is not after the previous frame")]
    OutOfOrder { index: usize, timestamp: Timestamp },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioMap {
    #[serde(default)]
    pub stop_signs: Vec<StopSignGroup>,
}

/// One recorded planning cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFrame {
    pub timestamp: Timestamp,
    pub ego: EgoState,
    #[serde(default)]
    pub stop_signs: Vec<StopSignApproach>,
    #[serde(default)]
    pub tracks: Option<Vec<VehicleTrack>>,
}

impl ScenarioFrame {
    pub fn cycle_frame(&self) -> CycleFrame {
        CycleFrame {
            ego: self.ego.clone(),
            stop_signs: self.stop_signs.clone(),
            tracks: self.tracks.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub map: ScenarioMap,
    pub frames: Vec<ScenarioFrame>,
}

impl Scenario {
    /// Read and check a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse a scenario and check its frames are strictly time-ordered.
    pub fn parse(raw: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(raw)?;
        if scenario.frames.is_empty() {
            return Err(ScenarioError::Empty);
        }
        let mut previous: Option<Timestamp> = None;
        for (index, frame) in scenario.frames.iter().enumerate() {
            let t = frame.timestamp;
            let ordered = t.as_secs().is_finite() && previous.is_none_or(|p| t > p);
            if !ordered {
                return Err(ScenarioError::OutOfOrder {
                    index,
                    timestamp: t,
                });
            }
            previous = Some(t);
        }
        Ok(scenario)
    }

    pub fn map(&self) -> StaticStopSignMap {
        StaticStopSignMap::new(self.map.stop_signs.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use junction_rules::StopSignMap;
    use junction_types::StopSignId;

    use super::*;

    const MINIMAL: &str = r#"{
        "map": { "stop_signs": [ { "id": "1017", "lanes": ["9762", "868_1_-1"] } ] },
        "frames": [
            { "timestamp": 100, "ego": { "lane": "9762", "speed": 4.0 },
              "stop_signs": [ { "id": "1017", "distance_to_stop_line": 12.0 } ],
              "tracks": [] },
            { "timestamp": 100.5, "ego": { "lane": "9762", "speed": 0.0 },
              "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.4 } ] }
        ]
    }"#;

    #[test]
    fn parses_minimal_scenario() {
        let scenario = Scenario::parse(MINIMAL).unwrap();
        assert_eq!(scenario.name, None);
        assert_eq!(scenario.frames.len(), 2);
        assert_eq!(scenario.frames[0].tracks, Some(vec![]));
        assert_eq!(scenario.frames[1].tracks, None);
        assert_eq!(scenario.frames[0].timestamp, Timestamp::from_secs(100.0));
        assert!(scenario.map().group(&StopSignId::from("1017")).is_ok());
    }

    #[test]
    fn cycle_frame_carries_frame_inputs() {
        let scenario = Scenario::parse(MINIMAL).unwrap();
        let frame = scenario.frames[1].cycle_frame();
        assert_eq!(frame.ego.speed, 0.0);
        assert_eq!(frame.stop_signs[0].distance_to_stop_line, 0.4);
        assert!(frame.tracks.is_none());
    }

    #[test]
    fn empty_scenario_is_rejected() {
        let err = Scenario::parse(r#"{"frames": []}"#).unwrap_err();
        assert!(matches!(err, ScenarioError::Empty));
    }

    #[test]
    fn time_must_move_forward() {
        let raw = r#"{"frames": [
            {"timestamp": 5.0, "ego": {"lane": "a", "speed": 0.0}},
            {"timestamp": 5.0, "ego": {"lane": "a", "speed": 0.0}}
        ]}"#;
        let err = Scenario::parse(raw).unwrap_err();
        assert!(matches!(err, ScenarioError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Scenario::parse("{ frames: "),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("scenario.json");
        fs::write(&path, MINIMAL).expect("write");
        assert_eq!(Scenario::load(&path).unwrap().frames.len(), 2);

        let missing = Scenario::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ScenarioError::Read { .. }));
    }
}
