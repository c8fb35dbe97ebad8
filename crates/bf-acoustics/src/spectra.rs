//! Welch cross-spectral matrix (CSM) estimation.

use crate::error::{AcousticError, AcousticResult};
use crate::time_data::TimeRecords;
use crate::{Shared, read_lock};
use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::sync::Arc;

/// Block overlap for Welch averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    None,
    Half,
    ThreeQuarters,
}

impl Overlap {
    pub fn label(&self) -> &'static str {
        match self {
            Overlap::None => "None",
            Overlap::Half => "50%",
            Overlap::ThreeQuarters => "75%",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "None" => Some(Overlap::None),
            "50%" => Some(Overlap::Half),
            "75%" => Some(Overlap::ThreeQuarters),
            _ => None,
        }
    }

    pub fn hop(&self, block_size: usize) -> usize {
        match self {
            Overlap::None => block_size,
            Overlap::Half => block_size / 2,
            Overlap::ThreeQuarters => block_size / 4,
        }
    }
}

/// Analysis window applied to each block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Rectangular,
    Hanning,
}

impl Window {
    pub fn label(&self) -> &'static str {
        match self {
            Window::Rectangular => "Rectangular",
            Window::Hanning => "Hanning",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Rectangular" => Some(Window::Rectangular),
            "Hanning" => Some(Window::Hanning),
            _ => None,
        }
    }

    pub fn values(&self, block_size: usize) -> Vec<f64> {
        match self {
            Window::Rectangular => vec![1.0; block_size],
            Window::Hanning => (0..block_size)
                .map(|i| {
                    let phase = 2.0 * std::f64::consts::PI * i as f64 / block_size as f64;
                    0.5 * (1.0 - phase.cos())
                })
                .collect(),
        }
    }
}

/// One CSM per frequency line, plus the line frequencies.
#[derive(Debug)]
pub struct CsmStack {
    pub freqs: Vec<f64>,
    pub matrices: Vec<DMatrix<Complex64>>,
    pub num_channels: usize,
}

struct CsmCache {
    own_rev: u64,
    data_rev: u64,
    stack: Arc<CsmStack>,
}

/// Power-spectra estimator stage. The CSM is expensive; it is cached and
/// keyed on this stage's revision plus the time-data revision, so any
/// parameter edit upstream invalidates it.
pub struct PowerSpectra {
    time: Shared<TimeRecords>,
    block_size: usize,
    overlap: Overlap,
    window: Window,
    revision: Revision,
    cache: Option<CsmCache>,
}

const BLOCK_SIZE_OPTIONS: [&str; 6] = ["128", "256", "512", "1024", "2048", "4096"];

impl PowerSpectra {
    pub fn new(time: Shared<TimeRecords>, block_size: usize, overlap: Overlap) -> Self {
        Self {
            time,
            block_size,
            overlap,
            window: Window::Hanning,
            revision: Revision::default(),
            cache: None,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Frequencies of the one-sided spectrum lines.
    pub fn fftfreq(&self) -> Vec<f64> {
        let fs = read_lock(&self.time).sample_rate();
        let df = fs / self.block_size as f64;
        (0..=self.block_size / 2).map(|i| i as f64 * df).collect()
    }

    /// Index of the line closest to `freq`.
    pub fn nearest_line(&self, freq: f64) -> usize {
        let fs = read_lock(&self.time).sample_rate();
        let df = fs / self.block_size as f64;
        ((freq / df).round() as usize).min(self.block_size / 2)
    }

    /// Welch estimate of the cross-spectral matrix stack. Cached until a
    /// parameter changes here or upstream.
    pub fn csm(&mut self) -> AcousticResult<Arc<CsmStack>> {
        let time = read_lock(&self.time);
        let data_rev = time.data_revision();
        let own_rev = self.revision.get();
        if let Some(cache) = &self.cache {
            if cache.own_rev == own_rev && cache.data_rev == data_rev {
                return Ok(Arc::clone(&cache.stack));
            }
        }

        let channels = time.valid_channels();
        if channels.is_empty() {
            return Err(AcousticError::NoData {
                what: "no valid channels",
            });
        }
        let block = self.block_size;
        let slices: Vec<&[f64]> = channels
            .iter()
            .map(|&ch| time.masked_channel(ch))
            .collect::<AcousticResult<_>>()?;
        let factors: Vec<f64> = channels.iter().map(|&ch| time.calib_factor(ch)).collect();
        let frames = slices.iter().map(|s| s.len()).min().unwrap_or(0);
        if frames < block {
            return Err(AcousticError::NoData {
                what: "masked range shorter than one block",
            });
        }

        let hop = self.overlap.hop(block);
        let num_blocks = (frames - block) / hop + 1;
        let window = self.window.values(block);
        let sum_w: f64 = window.iter().sum();
        let num_lines = block / 2 + 1;
        let num_channels = channels.len();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(block);

        let mut matrices =
            vec![DMatrix::<Complex64>::zeros(num_channels, num_channels); num_lines];
        let mut spectra = vec![vec![Complex64::default(); block]; num_channels];
        let mut line_vec = DVector::<Complex64>::zeros(num_channels);

        for b in 0..num_blocks {
            let offset = b * hop;
            for (ci, slice) in slices.iter().enumerate() {
                let buffer = &mut spectra[ci];
                for (i, w) in window.iter().enumerate() {
                    buffer[i] = Complex64::new(slice[offset + i] * factors[ci] * w, 0.0);
                }
                fft.process(buffer);
            }
            for (line, matrix) in matrices.iter_mut().enumerate() {
                for ci in 0..num_channels {
                    line_vec[ci] = spectra[ci][line];
                }
                *matrix += &line_vec * line_vec.adjoint();
            }
        }

        // Amplitude scaling: a bin-centered sine of amplitude A lands on the
        // CSM diagonal as its mean-square pressure A²/2.
        let scale = 2.0 / (sum_w * sum_w * num_blocks as f64);
        for matrix in &mut matrices {
            *matrix = matrix.scale(scale);
        }

        let fs = time.sample_rate();
        let df = fs / block as f64;
        let stack = Arc::new(CsmStack {
            freqs: (0..num_lines).map(|i| i as f64 * df).collect(),
            matrices,
            num_channels,
        });
        self.cache = Some(CsmCache {
            own_rev,
            data_rev,
            stack: Arc::clone(&stack),
        });
        Ok(stack)
    }
}

impl Configurable for PowerSpectra {
    fn stage_name(&self) -> &'static str {
        "FFT/CSM"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("block_size", "Block size", BLOCK_SIZE_OPTIONS.to_vec()),
            ParamSpec::choice("overlap", "Overlap", vec!["None", "50%", "75%"]),
            ParamSpec::choice("window", "Window", vec!["Rectangular", "Hanning"]),
        ]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "block_size" => Ok(ParamValue::Choice(self.block_size.to_string())),
            "overlap" => Ok(ParamValue::Choice(self.overlap.label().to_string())),
            "window" => Ok(ParamValue::Choice(self.window.label().to_string())),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "block_size" => {
                let choice = value.expect_choice(name)?;
                self.block_size = choice.parse().map_err(|_| bf_core::BfError::ParamType {
                    name: name.to_string(),
                    expected: "power-of-two block size",
                })?;
                self.revision.bump();
                Ok(())
            }
            "overlap" => {
                let choice = value.expect_choice(name)?;
                self.overlap =
                    Overlap::from_label(choice).ok_or_else(|| bf_core::BfError::ParamType {
                        name: name.to_string(),
                        expected: "one of None/50%/75%",
                    })?;
                self.revision.bump();
                Ok(())
            }
            "window" => {
                let choice = value.expect_choice(name)?;
                self.window =
                    Window::from_label(choice).ok_or_else(|| bf_core::BfError::ParamType {
                        name: name.to_string(),
                        expected: "one of Rectangular/Hanning",
                    })?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share;

    fn sine_records(freq: f64, amplitude: f64, fs: f64, frames: usize, channels: usize) -> TimeRecords {
        let channel: Vec<f64> = (0..frames)
            .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / fs).sin())
            .collect();
        TimeRecords::from_channel_data(fs, vec![channel; channels])
    }

    #[test]
    fn hop_sizes() {
        assert_eq!(Overlap::None.hop(1024), 1024);
        assert_eq!(Overlap::Half.hop(1024), 512);
        assert_eq!(Overlap::ThreeQuarters.hop(1024), 256);
    }

    #[test]
    fn hanning_window_is_zero_at_edges() {
        let w = Window::Hanning.values(8);
        assert!(w[0].abs() < 1e-12);
        assert!(w[4] > 0.99);
    }

    #[test]
    fn fftfreq_spans_to_nyquist() {
        let time = share(sine_records(1024.0, 1.0, 8192.0, 4096, 2));
        let ps = PowerSpectra::new(time, 256, Overlap::Half);
        let freqs = ps.fftfreq();
        assert_eq!(freqs.len(), 129);
        assert_eq!(freqs[0], 0.0);
        assert_eq!(*freqs.last().unwrap(), 4096.0);
    }

    #[test]
    fn bin_centered_sine_lands_on_diagonal() {
        // 1024 Hz is exactly bin 32 at fs=8192, block=256
        let amplitude = 2f64.sqrt();
        let time = share(sine_records(1024.0, amplitude, 8192.0, 8192, 3));
        let mut ps = PowerSpectra::new(time, 256, Overlap::Half);
        let stack = ps.csm().unwrap();
        let line = 32;
        let diag = stack.matrices[line][(0, 0)].re;
        // mean square of a sine with amplitude sqrt(2) is 1.0
        assert!((diag - 1.0).abs() < 0.05, "diag = {diag}");
        // identical channels are fully coherent
        let cross = stack.matrices[line][(0, 1)].norm();
        assert!((cross - diag).abs() < 1e-9);
    }

    #[test]
    fn csm_is_cached_until_revision_changes() {
        let time = share(sine_records(1024.0, 1.0, 8192.0, 4096, 2));
        let mut ps = PowerSpectra::new(time, 256, Overlap::Half);
        let first = ps.csm().unwrap();
        let second = ps.csm().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        ps.set_param("overlap", ParamValue::Choice("None".to_string()))
            .unwrap();
        let third = ps.csm().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn short_mask_is_no_data() {
        let time = share(sine_records(1024.0, 1.0, 8192.0, 4096, 2));
        crate::write_lock(&time).set_mask(0, 100);
        let mut ps = PowerSpectra::new(time, 256, Overlap::Half);
        assert!(matches!(
            ps.csm().unwrap_err(),
            AcousticError::NoData { .. }
        ));
    }
}
