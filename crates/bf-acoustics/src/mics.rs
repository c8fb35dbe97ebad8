//! Microphone array geometry.

use crate::error::{AcousticError, AcousticResult};
use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeometryFile {
    /// Microphone positions in meters, `[x, y, z]` per channel.
    positions: Vec<[f64; 3]>,
}

/// Microphone array stage. Invalid channels are kept in the position list
/// (indices stay aligned with the time data) but excluded from the
/// operative set used for steering.
#[derive(Debug, Clone)]
pub struct MicArray {
    path: Option<PathBuf>,
    positions: Vec<Vector3<f64>>,
    invalid_channels: Vec<usize>,
    revision: Revision,
}

impl MicArray {
    pub fn from_positions(positions: Vec<[f64; 3]>, invalid_channels: Vec<usize>) -> Self {
        Self {
            path: None,
            positions: positions.into_iter().map(Vector3::from).collect(),
            invalid_channels,
            revision: Revision::default(),
        }
    }

    pub fn from_file(path: &Path, invalid_channels: Vec<usize>) -> AcousticResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AcousticError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: GeometryFile =
            serde_yaml::from_str(&text).map_err(|e| AcousticError::Malformed {
                what: "microphone geometry",
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if file.positions.is_empty() {
            return Err(AcousticError::Malformed {
                what: "microphone geometry",
                path: path.to_path_buf(),
                message: "no positions".to_string(),
            });
        }
        let mut array = Self::from_positions(file.positions, invalid_channels);
        array.path = Some(path.to_path_buf());
        Ok(array)
    }

    /// Total channel count including invalid channels.
    pub fn num_channels(&self) -> usize {
        self.positions.len()
    }

    /// Positions of the operative (valid) microphones, in channel order.
    pub fn operative_positions(&self) -> Vec<Vector3<f64>> {
        self.positions
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.invalid_channels.contains(i))
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn num_operative(&self) -> usize {
        self.num_channels()
            - self
                .invalid_channels
                .iter()
                .filter(|&&i| i < self.num_channels())
                .count()
    }

    pub fn invalid_channels(&self) -> &[usize] {
        &self.invalid_channels
    }
}

impl Configurable for MicArray {
    fn stage_name(&self) -> &'static str {
        "Microphone Geometry"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec {
                name: "from_file",
                label: "Geometry file",
                kind: bf_core::ParamKind::Text,
                editable: false,
            },
            ParamSpec::int("num_channels", "Channels", 0, i64::MAX).read_only(),
            ParamSpec::index_list("invalid_channels", "Invalid channels"),
        ]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "from_file" => Ok(ParamValue::Text(
                self.path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            )),
            "num_channels" => Ok(ParamValue::Int(self.positions.len() as i64)),
            "invalid_channels" => Ok(ParamValue::IndexList(self.invalid_channels.clone())),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, _value: ParamValue) -> BfResult<()> {
        Err(unknown_param(name))
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_array() -> MicArray {
        MicArray::from_positions(
            vec![
                [-0.1, -0.1, 0.0],
                [0.1, -0.1, 0.0],
                [0.1, 0.1, 0.0],
                [-0.1, 0.1, 0.0],
            ],
            vec![1],
        )
    }

    #[test]
    fn invalid_channels_excluded_from_operative_set() {
        let array = square_array();
        assert_eq!(array.num_channels(), 4);
        assert_eq!(array.num_operative(), 3);
        let ops = array.operative_positions();
        assert_eq!(ops.len(), 3);
        // channel 1 skipped, channel 2 is second operative mic
        assert_eq!(ops[1], Vector3::new(0.1, 0.1, 0.0));
    }

    #[test]
    fn parses_yaml_positions() {
        let file: GeometryFile =
            serde_yaml::from_str("positions:\n  - [0.0, 0.0, 0.0]\n  - [0.1, 0.0, 0.0]\n").unwrap();
        assert_eq!(file.positions.len(), 2);
    }

    #[test]
    fn missing_geometry_file_is_fatal() {
        let err = MicArray::from_file(Path::new("/nonexistent/array.yaml"), vec![]).unwrap_err();
        assert!(matches!(err, AcousticError::FileRead { .. }));
    }
}
