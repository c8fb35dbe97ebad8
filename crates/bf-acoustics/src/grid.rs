//! Rectangular focus grid.

use bf_core::{BfError, BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in grid coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn from_center(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x_min: x - width / 2.0,
            y_min: y - height / 2.0,
            x_max: x + width / 2.0,
            y_max: y + height / 2.0,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Planar focus grid at height `z`, row-major with y as the row axis.
#[derive(Debug, Clone)]
pub struct FocusGrid {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    z: f64,
    increment: f64,
    revision: Revision,
}

impl FocusGrid {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, z: f64, increment: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            z,
            increment,
            revision: Revision::default(),
        }
    }

    pub fn nx(&self) -> usize {
        ((self.x_max - self.x_min) / self.increment).round() as usize + 1
    }

    pub fn ny(&self) -> usize {
        ((self.y_max - self.y_min) / self.increment).round() as usize + 1
    }

    pub fn num_points(&self) -> usize {
        self.nx() * self.ny()
    }

    pub fn point(&self, index: usize) -> Vector3<f64> {
        let nx = self.nx();
        let ix = index % nx;
        let iy = index / nx;
        Vector3::new(
            self.x_min + ix as f64 * self.increment,
            self.y_min + iy as f64 * self.increment,
            self.z,
        )
    }

    /// `[x_min, x_max, y_min, y_max]`
    pub fn extent(&self) -> [f64; 4] {
        [self.x_min, self.x_max, self.y_min, self.y_max]
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Indices of grid points inside `rect`.
    pub fn indices_in(&self, rect: &Rect) -> Vec<usize> {
        (0..self.num_points())
            .filter(|&i| {
                let p = self.point(i);
                rect.contains(p.x, p.y)
            })
            .collect()
    }
}

impl Configurable for FocusGrid {
    fn stage_name(&self) -> &'static str {
        "Focus Grid"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::float("x_min", "x min (m)", -10.0, 10.0, 0.01),
            ParamSpec::float("x_max", "x max (m)", -10.0, 10.0, 0.01),
            ParamSpec::float("y_min", "y min (m)", -10.0, 10.0, 0.01),
            ParamSpec::float("y_max", "y max (m)", -10.0, 10.0, 0.01),
            ParamSpec::float("z", "z (m)", 0.0, 100.0, 0.01),
            ParamSpec::float("increment", "Increment (m)", 0.001, 1.0, 0.001),
        ]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        let v = match name {
            "x_min" => self.x_min,
            "x_max" => self.x_max,
            "y_min" => self.y_min,
            "y_max" => self.y_max,
            "z" => self.z,
            "increment" => self.increment,
            _ => return Err(unknown_param(name)),
        };
        Ok(ParamValue::Float(v))
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        let v = value.expect_float(name)?;
        match name {
            "x_min" => self.x_min = v,
            "x_max" => self.x_max = v,
            "y_min" => self.y_min = v,
            "y_max" => self.y_max = v,
            "z" => self.z = v,
            "increment" => {
                if v <= 0.0 {
                    return Err(BfError::InvalidArg {
                        what: "grid increment must be positive",
                    });
                }
                self.increment = v;
            }
            _ => return Err(unknown_param(name)),
        }
        self.revision.bump();
        Ok(())
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_grid() -> FocusGrid {
        FocusGrid::new(-0.6, 0.0, -0.3, 0.3, 0.68, 0.01)
    }

    #[test]
    fn dimensions_from_increment() {
        let grid = example_grid();
        assert_eq!(grid.nx(), 61);
        assert_eq!(grid.ny(), 61);
        assert_eq!(grid.num_points(), 61 * 61);
    }

    #[test]
    fn point_ordering_is_row_major() {
        let grid = example_grid();
        let first = grid.point(0);
        assert_eq!(first, Vector3::new(-0.6, -0.3, 0.68));
        let second = grid.point(1);
        assert!((second.x - (-0.59)).abs() < 1e-12);
        assert_eq!(second.y, -0.3);
        let next_row = grid.point(61);
        assert_eq!(next_row.x, -0.6);
        assert!((next_row.y - (-0.29)).abs() < 1e-12);
    }

    #[test]
    fn rect_selects_interior_points() {
        let grid = FocusGrid::new(0.0, 0.1, 0.0, 0.1, 0.5, 0.05);
        // 3x3 grid; rect covering lower-left quadrant
        let rect = Rect::from_center(0.025, 0.025, 0.05, 0.05);
        let indices = grid.indices_in(&rect);
        assert_eq!(indices, vec![0, 1, 3, 4]);
    }

    proptest::proptest! {
        #[test]
        fn every_point_lies_inside_the_extent(index in 0usize..(61 * 61)) {
            let grid = example_grid();
            let [x_min, x_max, y_min, y_max] = grid.extent();
            let p = grid.point(index);
            proptest::prop_assert!(p.x >= x_min - 1e-12 && p.x <= x_max + 1e-12);
            proptest::prop_assert!(p.y >= y_min - 1e-12 && p.y <= y_max + 1e-12);
            proptest::prop_assert_eq!(p.z, grid.z());
        }
    }

    #[test]
    fn non_positive_increment_rejected() {
        let mut grid = example_grid();
        let err = grid.set_param("increment", ParamValue::Float(0.0)).unwrap_err();
        assert!(matches!(err, BfError::InvalidArg { .. }));
    }
}
