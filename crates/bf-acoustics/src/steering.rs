//! Steering vectors: grid points to expected phase/amplitude per microphone.

use crate::environment::Environment;
use crate::grid::FocusGrid;
use crate::mics::MicArray;
use crate::{Shared, read_lock};
use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Steering normalization. `TrueLevel` recovers the source level at the
/// reference distance; `TrueLocation` sharpens the peak position instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerKind {
    TrueLevel,
    TrueLocation,
}

impl SteerKind {
    pub fn label(&self) -> &'static str {
        match self {
            SteerKind::TrueLevel => "True level",
            SteerKind::TrueLocation => "True location",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "True level" => Some(SteerKind::TrueLevel),
            "True location" => Some(SteerKind::TrueLocation),
            _ => None,
        }
    }
}

/// Steering-vector stage referencing grid, microphones and environment.
pub struct SteeringVector {
    grid: Shared<FocusGrid>,
    mics: Shared<MicArray>,
    env: Shared<Environment>,
    kind: SteerKind,
    revision: Revision,
}

impl SteeringVector {
    pub fn new(grid: Shared<FocusGrid>, mics: Shared<MicArray>, env: Shared<Environment>) -> Self {
        Self {
            grid,
            mics,
            env,
            kind: SteerKind::TrueLevel,
            revision: Revision::default(),
        }
    }

    pub fn grid(&self) -> &Shared<FocusGrid> {
        &self.grid
    }

    pub fn num_operative_mics(&self) -> usize {
        read_lock(&self.mics).num_operative()
    }

    /// Free-field monopole transfer matrix (operative mics x grid points):
    /// `a_m = e^{-i k r_m} / r_m`.
    pub fn transfer_matrix(&self, freq: f64) -> DMatrix<Complex64> {
        let grid = read_lock(&self.grid);
        let positions = read_lock(&self.mics).operative_positions();
        let k = read_lock(&self.env).wavenumber(freq);
        let num_points = grid.num_points();
        DMatrix::from_fn(positions.len(), num_points, |mi, gi| {
            let r = (grid.point(gi) - positions[mi]).norm().max(1e-12);
            Complex64::from_polar(1.0 / r, -k * r)
        })
    }

    /// Steering matrix (operative mics x grid points), normalized per
    /// [`SteerKind`].
    pub fn steering_matrix(&self, freq: f64) -> DMatrix<Complex64> {
        let grid = read_lock(&self.grid);
        let positions = read_lock(&self.mics).operative_positions();
        let k = read_lock(&self.env).wavenumber(freq);
        let num_mics = positions.len();
        let num_points = grid.num_points();

        let mut out = DMatrix::<Complex64>::zeros(num_mics, num_points);
        for gi in 0..num_points {
            let p = grid.point(gi);
            let r0 = p.norm().max(1e-12);
            let radii: Vec<f64> = positions
                .iter()
                .map(|pos| (p - pos).norm().max(1e-12))
                .collect();
            let inv_sq_sum: f64 = radii.iter().map(|r| 1.0 / (r * r)).sum();
            for (mi, &r) in radii.iter().enumerate() {
                let norm = match self.kind {
                    SteerKind::TrueLevel => 1.0 / (r0 * r * inv_sq_sum),
                    SteerKind::TrueLocation => {
                        1.0 / (r * (num_mics as f64 * inv_sq_sum).sqrt())
                    }
                };
                out[(mi, gi)] = Complex64::from_polar(norm, -k * r);
            }
        }
        out
    }

    /// Combined revision of this stage and its upstream references.
    pub fn graph_revision(&self) -> u64 {
        self.revision
            .get()
            .wrapping_add(read_lock(&self.grid).revision())
            .wrapping_add(read_lock(&self.mics).revision())
            .wrapping_add(read_lock(&self.env).revision())
    }
}

impl Configurable for SteeringVector {
    fn stage_name(&self) -> &'static str {
        "Steering Vector"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::choice(
            "steer_type",
            "Steering formulation",
            vec!["True level", "True location"],
        )]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "steer_type" => Ok(ParamValue::Choice(self.kind.label().to_string())),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "steer_type" => {
                let choice = value.expect_choice(name)?;
                self.kind =
                    SteerKind::from_label(choice).ok_or_else(|| bf_core::BfError::ParamType {
                        name: name.to_string(),
                        expected: "one of True level/True location",
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

    fn simple_steering() -> SteeringVector {
        let grid = share(FocusGrid::new(-0.1, 0.1, -0.1, 0.1, 0.5, 0.1));
        let mics = share(MicArray::from_positions(
            vec![
                [-0.3, 0.0, 0.0],
                [0.3, 0.0, 0.0],
                [0.0, -0.3, 0.0],
                [0.0, 0.3, 0.0],
            ],
            vec![],
        ));
        let env = share(Environment::new(343.0));
        SteeringVector::new(grid, mics, env)
    }

    #[test]
    fn matrix_dimensions_match_graph() {
        let steer = simple_steering();
        let h = steer.steering_matrix(1000.0);
        assert_eq!(h.nrows(), 4);
        assert_eq!(h.ncols(), 9);
    }

    #[test]
    fn true_level_recovers_reference_level() {
        // h^H a at the focused point must be 1/r0 for the true-level form
        let steer = simple_steering();
        let h = steer.steering_matrix(1000.0);
        let a = steer.transfer_matrix(1000.0);
        let gi = 4; // grid center (0, 0, 0.5)
        let r0: f64 = 0.5;
        let dot: Complex64 = h.column(gi).dotc(&a.column(gi));
        assert!((dot.re - 1.0 / r0).abs() < 1e-9, "dot = {dot}");
        assert!(dot.im.abs() < 1e-9);
    }

    #[test]
    fn upstream_edit_changes_graph_revision() {
        let mut steer = simple_steering();
        let before = steer.graph_revision();
        crate::write_lock(steer.grid())
            .set_param("z", ParamValue::Float(0.6))
            .unwrap();
        assert_ne!(steer.graph_revision(), before);

        let before = steer.graph_revision();
        steer
            .set_param("steer_type", ParamValue::Choice("True location".to_string()))
            .unwrap();
        assert_ne!(steer.graph_revision(), before);
    }
}
