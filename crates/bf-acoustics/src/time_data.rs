//! Masked, calibrated multichannel time records.

use crate::calib::Calib;
use crate::error::{AcousticError, AcousticResult};
use crate::{Shared, read_lock};
use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use std::path::{Path, PathBuf};

/// Time-series source stage. Holds the full recording; `start`/`stop`
/// mask the sample range and `invalid_channels` mask unwanted microphones.
pub struct TimeRecords {
    path: Option<PathBuf>,
    sample_rate: f64,
    channel_data: Vec<Vec<f64>>,
    start: usize,
    stop: usize,
    invalid_channels: Vec<usize>,
    calib: Option<Shared<Calib>>,
    revision: Revision,
}

impl TimeRecords {
    pub fn from_channel_data(sample_rate: f64, channel_data: Vec<Vec<f64>>) -> Self {
        let frames = channel_data.first().map(Vec::len).unwrap_or(0);
        Self {
            path: None,
            sample_rate,
            channel_data,
            start: 0,
            stop: frames,
            invalid_channels: Vec::new(),
            calib: None,
            revision: Revision::default(),
        }
    }

    pub fn from_wav(path: &Path) -> AcousticResult<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(AcousticError::Malformed {
                what: "time data",
                path: path.to_path_buf(),
                message: "zero channels".to_string(),
            });
        }
        let mut channel_data = vec![Vec::new(); channels];
        match spec.sample_format {
            hound::SampleFormat::Float => {
                for (i, sample) in reader.samples::<f32>().enumerate() {
                    channel_data[i % channels].push(sample? as f64);
                }
            }
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f64;
                for (i, sample) in reader.samples::<i32>().enumerate() {
                    channel_data[i % channels].push(sample? as f64 * scale);
                }
            }
        }
        let mut records = Self::from_channel_data(spec.sample_rate as f64, channel_data);
        records.path = Some(path.to_path_buf());
        tracing::info!(
            path = %path.display(),
            channels,
            sample_rate = spec.sample_rate,
            duration_s = records.duration().get::<uom::si::time::second>(),
            "time data loaded"
        );
        Ok(records)
    }

    /// Total recording length.
    pub fn duration(&self) -> bf_core::Time {
        bf_core::s(self.num_frames() as f64 / self.sample_rate)
    }

    pub fn set_mask(&mut self, start: usize, stop: usize) {
        self.start = start;
        self.stop = stop;
        self.revision.bump();
    }

    pub fn set_invalid_channels(&mut self, invalid: Vec<usize>) {
        self.invalid_channels = invalid;
        self.revision.bump();
    }

    pub fn set_calib(&mut self, calib: Shared<Calib>) {
        self.calib = Some(calib);
        self.revision.bump();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channel_data.len()
    }

    pub fn num_frames(&self) -> usize {
        self.channel_data.first().map(Vec::len).unwrap_or(0)
    }

    /// Channels that survive the invalid-channel mask, in order.
    pub fn valid_channels(&self) -> Vec<usize> {
        (0..self.num_channels())
            .filter(|i| !self.invalid_channels.contains(i))
            .collect()
    }

    /// Masked sample slice for one channel.
    pub fn masked_channel(&self, channel: usize) -> AcousticResult<&[f64]> {
        let data = self
            .channel_data
            .get(channel)
            .ok_or(AcousticError::InvalidArg {
                what: "channel index",
            })?;
        let stop = self.stop.min(data.len());
        let start = self.start.min(stop);
        Ok(&data[start..stop])
    }

    /// Calibration factor for one channel (unity when no calibration stage
    /// is attached).
    pub fn calib_factor(&self, channel: usize) -> f64 {
        self.calib
            .as_ref()
            .map(|c| read_lock(c).factor(channel))
            .unwrap_or(1.0)
    }

    /// Combined revision of this stage and its calibration input. Spectral
    /// caches key on this.
    pub fn data_revision(&self) -> u64 {
        let calib_rev = self
            .calib
            .as_ref()
            .map(|c| read_lock(c).revision())
            .unwrap_or(0);
        self.revision.get().wrapping_add(calib_rev << 32)
    }
}

impl Configurable for TimeRecords {
    fn stage_name(&self) -> &'static str {
        "Time Data"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        let frames = self.num_frames() as i64;
        vec![
            ParamSpec {
                name: "name",
                label: "Source file",
                kind: bf_core::ParamKind::Text,
                editable: false,
            },
            ParamSpec::int("start", "First sample", 0, frames),
            ParamSpec::int("stop", "Last sample", 0, frames),
            ParamSpec::index_list("invalid_channels", "Invalid channels"),
            ParamSpec::float("sample_rate", "Sample rate (Hz)", 0.0, f64::MAX, 1.0).read_only(),
            ParamSpec::int("num_channels", "Channels", 0, i64::MAX).read_only(),
        ]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "name" => Ok(ParamValue::Text(
                self.path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            )),
            "start" => Ok(ParamValue::Int(self.start as i64)),
            "stop" => Ok(ParamValue::Int(self.stop as i64)),
            "invalid_channels" => Ok(ParamValue::IndexList(self.invalid_channels.clone())),
            "sample_rate" => Ok(ParamValue::Float(self.sample_rate)),
            "num_channels" => Ok(ParamValue::Int(self.num_channels() as i64)),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "start" => {
                self.start = value.expect_int(name)?.max(0) as usize;
                self.revision.bump();
                Ok(())
            }
            "stop" => {
                self.stop = value.expect_int(name)?.max(0) as usize;
                self.revision.bump();
                Ok(())
            }
            _ => Err(unknown_param(name)),
        }
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }
}
