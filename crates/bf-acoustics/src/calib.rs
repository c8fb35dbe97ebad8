//! Per-channel calibration factors.

use crate::error::{AcousticError, AcousticResult};
use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibFile {
    /// Multiplicative factor per channel, in file channel order.
    factors: Vec<f64>,
}

/// Calibration stage: multiplies each time-data channel by a fixed factor.
#[derive(Debug, Clone)]
pub struct Calib {
    path: Option<PathBuf>,
    factors: Vec<f64>,
    revision: Revision,
}

impl Calib {
    /// Identity calibration for `num_channels` channels.
    pub fn identity(num_channels: usize) -> Self {
        Self {
            path: None,
            factors: vec![1.0; num_channels],
            revision: Revision::default(),
        }
    }

    pub fn from_factors(factors: Vec<f64>) -> Self {
        Self {
            path: None,
            factors,
            revision: Revision::default(),
        }
    }

    pub fn from_file(path: &Path) -> AcousticResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AcousticError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CalibFile =
            serde_yaml::from_str(&text).map_err(|e| AcousticError::Malformed {
                what: "calibration",
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if file.factors.is_empty() {
            return Err(AcousticError::Malformed {
                what: "calibration",
                path: path.to_path_buf(),
                message: "no factors".to_string(),
            });
        }
        Ok(Self {
            path: Some(path.to_path_buf()),
            factors: file.factors,
            revision: Revision::default(),
        })
    }

    pub fn num_channels(&self) -> usize {
        self.factors.len()
    }

    pub fn factor(&self, channel: usize) -> f64 {
        self.factors.get(channel).copied().unwrap_or(1.0)
    }
}

impl Configurable for Calib {
    fn stage_name(&self) -> &'static str {
        "Calibration"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec {
                name: "from_file",
                label: "Calibration file",
                kind: bf_core::ParamKind::Text,
                editable: false,
            },
            ParamSpec::int("num_channels", "Channels", 0, i64::MAX).read_only(),
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
            "num_channels" => Ok(ParamValue::Int(self.factors.len() as i64)),
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

    #[test]
    fn identity_has_unit_factors() {
        let cal = Calib::identity(4);
        assert_eq!(cal.num_channels(), 4);
        assert_eq!(cal.factor(2), 1.0);
    }

    #[test]
    fn parses_yaml_factors() {
        let file: CalibFile = serde_yaml::from_str("factors: [1.0, 0.98, 1.02]").unwrap();
        assert_eq!(file.factors.len(), 3);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = Calib::from_file(Path::new("/nonexistent/calib.yaml")).unwrap_err();
        assert!(matches!(err, AcousticError::FileRead { .. }));
    }

    #[test]
    fn out_of_range_channel_falls_back_to_unity() {
        let cal = Calib::from_factors(vec![2.0]);
        assert_eq!(cal.factor(0), 2.0);
        assert_eq!(cal.factor(5), 1.0);
    }
}
