use crate::BfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Reference sound pressure (20 µPa), squared for level conversion.
pub const P_REF: Real = 2e-5;

/// Levels at or below this floor are treated as undefined rather than
/// plotted as a real number.
pub const LEVEL_FLOOR_DB: Real = -300.0;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, BfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BfError::NonFinite { what, value: v })
    }
}

/// Sound pressure level in dB re 20 µPa of a squared-pressure value.
pub fn sound_pressure_level(p_sq: Real) -> Real {
    10.0 * (p_sq / (P_REF * P_REF)).log10()
}

/// Level with the floor applied: values at or below [`LEVEL_FLOOR_DB`]
/// (including the -inf produced by a zero input) become `None`.
pub fn level_or_undefined(p_sq: Real) -> Option<Real> {
    let level = sound_pressure_level(p_sq);
    if level.is_finite() && level > LEVEL_FLOOR_DB {
        Some(level)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn reference_pressure_is_zero_db() {
        let level = sound_pressure_level(P_REF * P_REF);
        assert!(level.abs() < 1e-12);
    }

    #[test]
    fn zero_power_is_undefined() {
        assert_eq!(level_or_undefined(0.0), None);
    }

    #[test]
    fn sub_floor_level_is_undefined_not_sentinel() {
        // 1e-35 Pa² is far below the -300 dB floor
        assert_eq!(level_or_undefined(1e-35), None);
    }

    proptest! {
        #[test]
        fn spl_monotonic(a in 1e-20f64..1e6, factor in 1.0001f64..1e6) {
            let lo = sound_pressure_level(a);
            let hi = sound_pressure_level(a * factor);
            prop_assert!(hi > lo);
        }

        #[test]
        fn defined_levels_are_above_floor(p_sq in 1e-40f64..1e6) {
            if let Some(level) = level_or_undefined(p_sq) {
                prop_assert!(level > LEVEL_FLOOR_DB);
                prop_assert!(level.is_finite());
            }
        }
    }
}
