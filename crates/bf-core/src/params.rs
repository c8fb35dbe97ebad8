//! Descriptive parameter capability shared by all pipeline stages.
//!
//! Every stage exposes its settable parameters as [`ParamSpec`] descriptors
//! (name, kind, constraints) so the selection/binding layer can build
//! controls for any stage without knowing its concrete type. Parameter
//! writes bump a per-stage revision; downstream caches compare revisions
//! instead of subscribing to an event bus.

use crate::error::{BfError, BfResult};
use serde::{Deserialize, Serialize};

/// Kind and constraints of a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Float { min: f64, max: f64, step: f64 },
    Int { min: i64, max: i64 },
    Bool,
    Text,
    /// One of a fixed set of options.
    Choice { options: Vec<&'static str> },
    /// List of channel indices (display-only in the UI).
    IndexList,
}

/// Descriptor for one named, independently settable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Stable identifier used by `param`/`set_param`.
    pub name: &'static str,
    /// Human-readable label for the control surface.
    pub label: &'static str,
    pub kind: ParamKind,
    /// Read-only parameters still get a control, but a disabled one.
    pub editable: bool,
}

impl ParamSpec {
    pub fn float(name: &'static str, label: &'static str, min: f64, max: f64, step: f64) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::Float { min, max, step },
            editable: true,
        }
    }

    pub fn int(name: &'static str, label: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::Int { min, max },
            editable: true,
        }
    }

    pub fn bool(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::Bool,
            editable: true,
        }
    }

    pub fn choice(name: &'static str, label: &'static str, options: Vec<&'static str>) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::Choice { options },
            editable: true,
        }
    }

    pub fn index_list(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::IndexList,
            editable: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }
}

/// Current value of a parameter, matched against its [`ParamKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Choice(String),
    IndexList(Vec<usize>),
}

impl ParamValue {
    pub fn expect_float(&self, name: &str) -> BfResult<f64> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            _ => Err(BfError::ParamType {
                name: name.to_string(),
                expected: "float",
            }),
        }
    }

    pub fn expect_int(&self, name: &str) -> BfResult<i64> {
        match self {
            ParamValue::Int(v) => Ok(*v),
            _ => Err(BfError::ParamType {
                name: name.to_string(),
                expected: "int",
            }),
        }
    }

    pub fn expect_bool(&self, name: &str) -> BfResult<bool> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(BfError::ParamType {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }

    pub fn expect_choice(&self, name: &str) -> BfResult<&str> {
        match self {
            ParamValue::Choice(v) => Ok(v.as_str()),
            _ => Err(BfError::ParamType {
                name: name.to_string(),
                expected: "choice",
            }),
        }
    }
}

/// Polymorphic stage capability: parameters described by data, values
/// read and written by name. Implementations bump their revision on every
/// accepted write.
pub trait Configurable {
    /// Short stable name of the stage (for logs and settings groups).
    fn stage_name(&self) -> &'static str;

    fn param_specs(&self) -> Vec<ParamSpec>;

    fn param(&self, name: &str) -> BfResult<ParamValue>;

    fn set_param(&mut self, name: &str, value: ParamValue) -> BfResult<()>;

    /// Monotonically increasing counter, bumped on every accepted
    /// `set_param`. Downstream caches validate against this.
    fn revision(&self) -> u64;
}

/// Revision counter embedded in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revision(u64);

impl Revision {
    pub fn bump(&mut self) {
        self.0 += 1;
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Error constructor for an unknown parameter name.
pub fn unknown_param(name: &str) -> BfError {
    BfError::UnknownParam {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_bumps() {
        let mut rev = Revision::default();
        assert_eq!(rev.get(), 0);
        rev.bump();
        rev.bump();
        assert_eq!(rev.get(), 2);
    }

    #[test]
    fn expect_float_rejects_other_kinds() {
        let v = ParamValue::Int(3);
        let err = v.expect_float("freq").unwrap_err();
        assert!(format!("{err}").contains("freq"));
    }

    #[test]
    fn spec_constructors_set_kind() {
        let spec = ParamSpec::float("freq", "Frequency (Hz)", 20.0, 20_000.0, 10.0);
        assert!(spec.editable);
        assert!(matches!(spec.kind, ParamKind::Float { .. }));

        let ro = ParamSpec::index_list("invalid_channels", "Invalid channels");
        assert!(!ro.editable);
    }
}
