//! bf-core: stable foundation for beamflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + level/dB helpers)
//! - params (descriptive parameter capability shared by all pipeline stages)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod params;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{BfError, BfResult};
pub use numeric::*;
pub use params::*;
pub use units::*;
