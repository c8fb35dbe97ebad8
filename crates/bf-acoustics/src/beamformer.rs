//! Frequency-domain beamformer variants.
//!
//! All variants share a [`BeamformerCore`] (references to the spectral
//! estimator and the steering vector) and differ only in how one CSM line
//! is turned into per-grid-point powers. The [`SourceEstimator`] trait
//! provides band synthesis and sector integration on top of that.

use crate::error::{AcousticError, AcousticResult};
use crate::grid::Rect;
use crate::spectra::PowerSpectra;
use crate::steering::SteeringVector;
use crate::{Shared, read_lock, write_lock};
use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use nalgebra::DMatrix;
use num_complex::Complex64;
use rayon::prelude::*;

/// Frequency band synthesized around the map frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Line,
    Octave,
    ThirdOctave,
}

impl Band {
    pub fn label(&self) -> &'static str {
        match self {
            Band::Line => "Single line",
            Band::Octave => "Octave",
            Band::ThirdOctave => "Third octave",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Single line" => Some(Band::Line),
            "Octave" => Some(Band::Octave),
            "Third octave" => Some(Band::ThirdOctave),
            _ => None,
        }
    }

    /// Band edges around `freq` (equal for a single line).
    pub fn bounds(&self, freq: f64) -> (f64, f64) {
        let half_width = match self {
            Band::Line => return (freq, freq),
            Band::Octave => 2f64.sqrt(),
            Band::ThirdOctave => 2f64.powf(1.0 / 6.0),
        };
        (freq / half_width, freq * half_width)
    }
}

/// Computed source map: raw squared pressures per grid point, plus the
/// grid metadata captured at compute time so the frame is self-contained.
#[derive(Debug, Clone)]
pub struct SourceMap {
    pub nx: usize,
    pub ny: usize,
    /// `[x_min, x_max, y_min, y_max]`
    pub extent: [f64; 4],
    pub z: f64,
    pub freq: f64,
    pub band: Band,
    /// Row-major (y rows), squared pressures in Pa².
    pub values: Vec<f64>,
}

/// Sector-integrated spectrum: raw band powers per frequency line.
#[derive(Debug, Clone)]
pub struct SectorSpectrum {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}

/// Shared upstream references of every beamformer variant.
pub struct BeamformerCore {
    freq_data: Shared<PowerSpectra>,
    steer: Shared<SteeringVector>,
    r_diag: bool,
}

impl BeamformerCore {
    pub fn new(freq_data: Shared<PowerSpectra>, steer: Shared<SteeringVector>) -> Self {
        Self {
            freq_data,
            steer,
            r_diag: false,
        }
    }

    /// CSM line with optional diagonal removal.
    fn prepare_csm(&self, csm: &DMatrix<Complex64>) -> DMatrix<Complex64> {
        let mut out = csm.clone();
        if self.r_diag {
            for i in 0..out.nrows() {
                out[(i, i)] = Complex64::default();
            }
        }
        out
    }

    fn lines_in_band(freqs: &[f64], freq: f64, band: Band) -> AcousticResult<Vec<usize>> {
        match band {
            Band::Line => {
                let line = freqs
                    .iter()
                    .enumerate()
                    .skip(1)
                    .min_by(|(_, a), (_, b)| {
                        (*a - freq).abs().total_cmp(&(*b - freq).abs())
                    })
                    .map(|(i, _)| i)
                    .ok_or(AcousticError::NoData {
                        what: "empty spectrum",
                    })?;
                Ok(vec![line])
            }
            _ => {
                let (lo, hi) = band.bounds(freq);
                let lines: Vec<usize> = freqs
                    .iter()
                    .enumerate()
                    .skip(1)
                    .filter(|(_, f)| **f >= lo && **f <= hi)
                    .map(|(i, _)| i)
                    .collect();
                if lines.is_empty() {
                    Err(AcousticError::InvalidArg {
                        what: "no spectral lines inside the requested band",
                    })
                } else {
                    Ok(lines)
                }
            }
        }
    }
}

/// A beamformer variant: computes a source map and integrates sectors.
///
/// `map_at` is the only variant-specific piece: powers at the given grid
/// indices for one prepared CSM line.
pub trait SourceEstimator: Configurable + Send + Sync {
    fn core(&self) -> &BeamformerCore;

    fn map_at(
        &self,
        freq: f64,
        csm: &DMatrix<Complex64>,
        steer: &DMatrix<Complex64>,
        indices: &[usize],
    ) -> AcousticResult<Vec<f64>>;

    /// Compute the source map for the band around `freq`, summing raw
    /// powers over all lines inside the band.
    fn source_map(&self, freq: f64, band: Band) -> AcousticResult<SourceMap> {
        let core = self.core();
        let stack = write_lock(&core.freq_data).csm()?;
        let steer = read_lock(&core.steer);
        if stack.num_channels != steer.num_operative_mics() {
            return Err(AcousticError::ChannelMismatch {
                time_channels: stack.num_channels,
                mic_channels: steer.num_operative_mics(),
            });
        }
        let lines = BeamformerCore::lines_in_band(&stack.freqs, freq, band)?;
        let (nx, ny, extent, z) = {
            let grid = read_lock(steer.grid());
            (grid.nx(), grid.ny(), grid.extent(), grid.z())
        };
        let indices: Vec<usize> = (0..nx * ny).collect();

        let mut values = vec![0.0; nx * ny];
        for &line in &lines {
            let line_freq = stack.freqs[line];
            let h = steer.steering_matrix(line_freq);
            let csm = core.prepare_csm(&stack.matrices[line]);
            let powers = self.map_at(line_freq, &csm, &h, &indices)?;
            for (acc, p) in values.iter_mut().zip(powers) {
                *acc += p;
            }
        }
        tracing::debug!(
            stage = self.stage_name(),
            freq,
            lines = lines.len(),
            points = values.len(),
            "source map computed"
        );
        Ok(SourceMap {
            nx,
            ny,
            extent,
            z,
            freq,
            band,
            values,
        })
    }

    /// Integrate raw powers over `rect` for every frequency line.
    fn integrate(&self, rect: Rect) -> AcousticResult<SectorSpectrum> {
        let core = self.core();
        let stack = write_lock(&core.freq_data).csm()?;
        let steer = read_lock(&core.steer);
        if stack.num_channels != steer.num_operative_mics() {
            return Err(AcousticError::ChannelMismatch {
                time_channels: stack.num_channels,
                mic_channels: steer.num_operative_mics(),
            });
        }
        let indices = read_lock(steer.grid()).indices_in(&rect);

        let mut power = vec![0.0; stack.freqs.len()];
        if !indices.is_empty() {
            for (line, value) in power.iter_mut().enumerate().skip(1) {
                let line_freq = stack.freqs[line];
                let h = steer.steering_matrix(line_freq);
                let csm = core.prepare_csm(&stack.matrices[line]);
                *value = self.map_at(line_freq, &csm, &h, &indices)?.iter().sum();
            }
        }
        Ok(SectorSpectrum {
            freqs: stack.freqs.clone(),
            power,
        })
    }

    /// All spectral line frequencies of the upstream estimator.
    fn frequencies(&self) -> Vec<f64> {
        read_lock(&self.core().freq_data).fftfreq()
    }
}

impl std::fmt::Debug for dyn SourceEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEstimator")
            .field("stage_name", &self.stage_name())
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------
// Variants

/// Conventional delay-and-sum beamforming.
pub struct ConventionalBeamformer {
    core: BeamformerCore,
    revision: Revision,
}

impl ConventionalBeamformer {
    pub fn new(freq_data: Shared<PowerSpectra>, steer: Shared<SteeringVector>) -> Self {
        Self {
            core: BeamformerCore::new(freq_data, steer),
            revision: Revision::default(),
        }
    }
}

impl SourceEstimator for ConventionalBeamformer {
    fn core(&self) -> &BeamformerCore {
        &self.core
    }

    fn map_at(
        &self,
        _freq: f64,
        csm: &DMatrix<Complex64>,
        steer: &DMatrix<Complex64>,
        indices: &[usize],
    ) -> AcousticResult<Vec<f64>> {
        Ok(indices
            .par_iter()
            .map(|&gi| {
                let h = steer.column(gi);
                let ch = csm * h;
                // diagonal removal can push the quadratic form negative
                h.dotc(&ch).re.max(0.0)
            })
            .collect())
    }
}

impl Configurable for ConventionalBeamformer {
    fn stage_name(&self) -> &'static str {
        "Conventional Beamforming"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::bool("r_diag", "Remove CSM diagonal")]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "r_diag" => Ok(ParamValue::Bool(self.core.r_diag)),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "r_diag" => {
                self.core.r_diag = value.expect_bool(name)?;
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

/// Functional beamforming (matrix-power weighting with exponent gamma).
pub struct FunctionalBeamformer {
    core: BeamformerCore,
    gamma: f64,
    revision: Revision,
}

impl FunctionalBeamformer {
    pub fn new(freq_data: Shared<PowerSpectra>, steer: Shared<SteeringVector>, gamma: f64) -> Self {
        Self {
            core: BeamformerCore::new(freq_data, steer),
            gamma,
            revision: Revision::default(),
        }
    }
}

impl SourceEstimator for FunctionalBeamformer {
    fn core(&self) -> &BeamformerCore {
        &self.core
    }

    fn map_at(
        &self,
        _freq: f64,
        csm: &DMatrix<Complex64>,
        steer: &DMatrix<Complex64>,
        indices: &[usize],
    ) -> AcousticResult<Vec<f64>> {
        let gamma = self.gamma;
        let eig = csm.clone().symmetric_eigen();
        let vh = eig.eigenvectors.adjoint();
        let roots: Vec<f64> = eig
            .eigenvalues
            .iter()
            .map(|l| l.max(0.0).powf(1.0 / gamma))
            .collect();
        Ok(indices
            .par_iter()
            .map(|&gi| {
                let w = &vh * steer.column(gi);
                let base: f64 = roots
                    .iter()
                    .zip(w.iter())
                    .map(|(root, wi)| root * wi.norm_sqr())
                    .sum();
                base.powf(gamma)
            })
            .collect())
    }
}

impl Configurable for FunctionalBeamformer {
    fn stage_name(&self) -> &'static str {
        "Functional Beamforming"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::float("gamma", "Exponent", 1.0, 64.0, 1.0),
            ParamSpec::bool("r_diag", "Remove CSM diagonal"),
        ]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "gamma" => Ok(ParamValue::Float(self.gamma)),
            "r_diag" => Ok(ParamValue::Bool(self.core.r_diag)),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "gamma" => {
                let v = value.expect_float(name)?;
                if v < 1.0 {
                    return Err(bf_core::BfError::InvalidArg {
                        what: "gamma must be >= 1",
                    });
                }
                self.gamma = v;
                self.revision.bump();
                Ok(())
            }
            "r_diag" => {
                self.core.r_diag = value.expect_bool(name)?;
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

/// Capon (minimum variance) beamforming. Needs an invertible CSM.
pub struct CaponBeamformer {
    core: BeamformerCore,
    revision: Revision,
}

impl CaponBeamformer {
    pub fn new(freq_data: Shared<PowerSpectra>, steer: Shared<SteeringVector>) -> Self {
        Self {
            core: BeamformerCore::new(freq_data, steer),
            revision: Revision::default(),
        }
    }
}

impl SourceEstimator for CaponBeamformer {
    fn core(&self) -> &BeamformerCore {
        &self.core
    }

    fn map_at(
        &self,
        freq: f64,
        csm: &DMatrix<Complex64>,
        steer: &DMatrix<Complex64>,
        indices: &[usize],
    ) -> AcousticResult<Vec<f64>> {
        let inverse = csm
            .clone()
            .try_inverse()
            .ok_or(AcousticError::SingularCsm { freq_hz: freq })?;
        Ok(indices
            .par_iter()
            .map(|&gi| {
                let h = steer.column(gi);
                let ih = &inverse * h;
                let denom = h.dotc(&ih).re;
                if denom > 0.0 { 1.0 / denom } else { 0.0 }
            })
            .collect())
    }
}

impl Configurable for CaponBeamformer {
    fn stage_name(&self) -> &'static str {
        "Capon Beamforming"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        Err(unknown_param(name))
    }

    fn set_param(&mut self, name: &str, _value: ParamValue) -> BfResult<()> {
        Err(unknown_param(name))
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }
}

/// Eigenvalue beamforming over the strongest `n` components.
pub struct EigBeamformer {
    core: BeamformerCore,
    n: usize,
    revision: Revision,
}

impl EigBeamformer {
    pub fn new(freq_data: Shared<PowerSpectra>, steer: Shared<SteeringVector>, n: usize) -> Self {
        Self {
            core: BeamformerCore::new(freq_data, steer),
            n,
            revision: Revision::default(),
        }
    }
}

/// Eigenvalue indices sorted by descending eigenvalue.
fn sorted_components(eigenvalues: &nalgebra::DVector<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));
    order
}

impl SourceEstimator for EigBeamformer {
    fn core(&self) -> &BeamformerCore {
        &self.core
    }

    fn map_at(
        &self,
        _freq: f64,
        csm: &DMatrix<Complex64>,
        steer: &DMatrix<Complex64>,
        indices: &[usize],
    ) -> AcousticResult<Vec<f64>> {
        let eig = csm.clone().symmetric_eigen();
        let vh = eig.eigenvectors.adjoint();
        let order = sorted_components(&eig.eigenvalues);
        let keep = &order[..self.n.min(order.len())];
        Ok(indices
            .par_iter()
            .map(|&gi| {
                let w = &vh * steer.column(gi);
                keep.iter()
                    .map(|&i| eig.eigenvalues[i].max(0.0) * w[i].norm_sqr())
                    .sum()
            })
            .collect())
    }
}

impl Configurable for EigBeamformer {
    fn stage_name(&self) -> &'static str {
        "Eigenvalue Beamforming"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::int("n", "Components", 1, 256)]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "n" => Ok(ParamValue::Int(self.n as i64)),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "n" => {
                self.n = value.expect_int(name)?.max(1) as usize;
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

/// MUSIC beamforming with `n` assumed sources.
pub struct MusicBeamformer {
    core: BeamformerCore,
    n: usize,
    revision: Revision,
}

impl MusicBeamformer {
    pub fn new(freq_data: Shared<PowerSpectra>, steer: Shared<SteeringVector>, n: usize) -> Self {
        Self {
            core: BeamformerCore::new(freq_data, steer),
            n,
            revision: Revision::default(),
        }
    }
}

impl SourceEstimator for MusicBeamformer {
    fn core(&self) -> &BeamformerCore {
        &self.core
    }

    fn map_at(
        &self,
        _freq: f64,
        csm: &DMatrix<Complex64>,
        steer: &DMatrix<Complex64>,
        indices: &[usize],
    ) -> AcousticResult<Vec<f64>> {
        let eig = csm.clone().symmetric_eigen();
        let vh = eig.eigenvectors.adjoint();
        let order = sorted_components(&eig.eigenvalues);
        let noise = &order[self.n.min(order.len())..];
        Ok(indices
            .par_iter()
            .map(|&gi| {
                let w = &vh * steer.column(gi);
                let denom: f64 = noise.iter().map(|&i| w[i].norm_sqr()).sum();
                1.0 / denom.max(1e-30)
            })
            .collect())
    }
}

impl Configurable for MusicBeamformer {
    fn stage_name(&self) -> &'static str {
        "Music Beamforming"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::int("n", "Sources", 1, 256)]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "n" => Ok(ParamValue::Int(self.n as i64)),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "n" => {
                self.n = value.expect_int(name)?.max(1) as usize;
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

    #[test]
    fn band_bounds_single_line_degenerate() {
        let (lo, hi) = Band::Line.bounds(4000.0);
        assert_eq!(lo, hi);
    }

    #[test]
    fn third_octave_bounds() {
        let (lo, hi) = Band::ThirdOctave.bounds(4000.0);
        assert!((hi / lo - 2f64.powf(1.0 / 3.0)).abs() < 1e-12);
        assert!((lo * hi - 4000.0 * 4000.0).abs() < 1e-6);
    }

    #[test]
    fn lines_in_band_skips_dc() {
        let freqs: Vec<f64> = (0..129).map(|i| i as f64 * 32.0).collect();
        let lines = BeamformerCore::lines_in_band(&freqs, 16.0, Band::Line).unwrap();
        assert_eq!(lines, vec![1]);
    }

    #[test]
    fn empty_band_is_an_error() {
        let freqs = vec![0.0, 1000.0, 2000.0];
        let result = BeamformerCore::lines_in_band(&freqs, 10.0, Band::ThirdOctave);
        assert!(result.is_err());
    }

    #[test]
    fn sorted_components_descending() {
        let values = nalgebra::DVector::from_vec(vec![1.0, 5.0, 3.0]);
        assert_eq!(sorted_components(&values), vec![1, 2, 0]);
    }
}
