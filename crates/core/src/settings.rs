//! Viewer settings loaded from an optional JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use roadview_protocol::Viewport;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::live::DEFAULT_TREND_CAPACITY;
use crate::model::LaneParsePolicy;
use crate::views::RoadStyle;

pub const DEFAULT_CONFIG_PATH: &str = "sumo/final.sumocfg";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Export canvas size used when the live panel has no usable size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportSize {
    pub width: f64,
    pub height: f64,
}

impl ExportSize {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Simulation configuration document naming the network file.
    pub config_path: PathBuf,
    pub lane_policy: LaneParsePolicy,
    pub road_style: RoadStyle,
    pub trend_capacity: usize,
    pub map_export_fallback: ExportSize,
    pub trend_export_fallback: ExportSize,
    /// Vehicles spawned by the synthetic feed.
    pub feed_vehicles: usize,
    pub feed_tick_ms: u64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            lane_policy: LaneParsePolicy::default(),
            road_style: RoadStyle::default(),
            trend_capacity: DEFAULT_TREND_CAPACITY,
            map_export_fallback: ExportSize {
                width: 1200.0,
                height: 800.0,
            },
            trend_export_fallback: ExportSize {
                width: 900.0,
                height: 320.0,
            },
            feed_vehicles: 40,
            feed_tick_ms: 100,
        }
    }
}

impl ViewerSettings {
    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_json(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn feed_tick(&self) -> Duration {
        Duration::from_millis(self.feed_tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let settings = ViewerSettings::from_json("{}").unwrap();
        assert_eq!(settings, ViewerSettings::default());
        assert_eq!(settings.road_style.thickness_multiplier, 1.25);
        assert_eq!(settings.road_style.min_pixel_width, 6.0);
        assert_eq!(settings.trend_capacity, 120);
    }

    #[test]
    fn partial_nested_settings_keep_other_defaults() {
        let settings = ViewerSettings::from_json(
            r#"{"lane_policy": {"include_internal": false}, "road_style": {"lane_markings": false}, "feed_tick_ms": 0}"#,
        )
        .unwrap();
        assert!(!settings.lane_policy.include_internal);
        assert!(settings.lane_policy.include_all_lanes);
        assert!(!settings.road_style.lane_markings);
        assert_eq!(settings.road_style.min_pixel_width, 6.0);
        assert_eq!(settings.feed_tick(), Duration::from_millis(1));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("roadview-settings-does-not-exist.json");
        let settings = ViewerSettings::load(&path).unwrap();
        assert_eq!(settings.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("roadview-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ViewerSettings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }
}
