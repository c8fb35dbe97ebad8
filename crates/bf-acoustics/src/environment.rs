//! Acoustic environment (propagation medium).

use bf_core::{BfResult, Configurable, ParamSpec, ParamValue, Revision, unknown_param};

/// Homogeneous medium with a single speed of sound.
#[derive(Debug, Clone)]
pub struct Environment {
    c: f64,
    revision: Revision,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(343.0)
    }
}

impl Environment {
    pub fn new(c: f64) -> Self {
        Self {
            c,
            revision: Revision::default(),
        }
    }

    /// Speed of sound in m/s.
    pub fn speed_of_sound(&self) -> f64 {
        self.c
    }

    /// Wavenumber k = 2πf/c.
    pub fn wavenumber(&self, freq: f64) -> f64 {
        2.0 * std::f64::consts::PI * freq / self.c
    }
}

impl Configurable for Environment {
    fn stage_name(&self) -> &'static str {
        "Environment"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("c", "Speed of sound (m/s)", 100.0, 2000.0, 0.01)]
    }

    fn param(&self, name: &str) -> BfResult<ParamValue> {
        match name {
            "c" => Ok(ParamValue::Float(self.c)),
            _ => Err(unknown_param(name)),
        }
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()> {
        match name {
            "c" => {
                self.c = value.expect_float(name)?;
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
    fn wavenumber_matches_definition() {
        let env = Environment::new(346.04);
        let k = env.wavenumber(4000.0);
        assert!((k - 2.0 * std::f64::consts::PI * 4000.0 / 346.04).abs() < 1e-12);
    }

    #[test]
    fn set_c_bumps_revision() {
        let mut env = Environment::default();
        let before = env.revision();
        env.set_param("c", ParamValue::Float(346.04)).unwrap();
        assert_eq!(env.speed_of_sound(), 346.04);
        assert!(env.revision() > before);
    }

    #[test]
    fn unknown_param_rejected() {
        let mut env = Environment::default();
        assert!(env.set_param("rho", ParamValue::Float(1.2)).is_err());
    }
}
