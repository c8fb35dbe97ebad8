//! Static pipeline configuration.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Focus-grid extent and resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z: f64,
    pub increment: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_min: -0.6,
            x_max: 0.0,
            y_min: -0.3,
            y_max: 0.3,
            z: 0.68,
            increment: 0.01,
        }
    }
}

fn default_stop() -> usize {
    16_000
}

fn default_block_size() -> usize {
    1024
}

fn default_speed_of_sound() -> f64 {
    346.04
}

/// Everything the registry needs to build the stage graph. Deterministic:
/// the same config always yields the same pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Multichannel WAV recording.
    pub time_data: PathBuf,
    /// Microphone geometry YAML.
    pub geometry: PathBuf,
    /// Optional per-channel calibration YAML.
    #[serde(default)]
    pub calibration: Option<PathBuf>,
    #[serde(default)]
    pub invalid_channels: Vec<usize>,
    #[serde(default)]
    pub start: usize,
    #[serde(default = "default_stop")]
    pub stop: usize,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default = "default_speed_of_sound")]
    pub speed_of_sound: f64,
    #[serde(default)]
    pub grid: GridConfig,
}

impl PipelineConfig {
    pub fn from_yaml(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|e| PipelineError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("time_data: example.wav\ngeometry: array.yaml\n").unwrap();
        assert_eq!(config.stop, 16_000);
        assert_eq!(config.block_size, 1024);
        assert_eq!(config.speed_of_sound, 346.04);
        assert_eq!(config.grid.z, 0.68);
        assert!(config.calibration.is_none());
    }

    #[test]
    fn invalid_channels_parse() {
        let config: PipelineConfig = serde_yaml::from_str(
            "time_data: example.wav\ngeometry: array.yaml\ninvalid_channels: [1, 7]\n",
        )
        .unwrap();
        assert_eq!(config.invalid_channels, vec![1, 7]);
    }

    #[test]
    fn missing_config_file_reported_with_path() {
        let err = PipelineConfig::from_yaml(Path::new("/nonexistent/beamflow.yaml")).unwrap_err();
        assert!(format!("{err}").contains("/nonexistent/beamflow.yaml"));
    }
}
