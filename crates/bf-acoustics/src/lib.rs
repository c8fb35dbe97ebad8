//! bf-acoustics: acoustic processing stages for beamflow.
//!
//! Provides:
//! - Calibrated multichannel time records (WAV input)
//! - Microphone array geometry and calibration (YAML input)
//! - Welch cross-spectral matrix estimation
//! - Focus grid and steering vectors
//! - `SourceEstimator` trait with interchangeable beamformer variants
//!
//! # Architecture
//!
//! Stages form a fixed graph: downstream stages hold shared handles to their
//! inputs (a beamformer references a spectral estimator and a steering
//! vector). Stage identities never change after construction; parameter
//! values do, and each write bumps the stage revision so caches further
//! down can tell when to recompute.

pub mod beamformer;
pub mod calib;
pub mod environment;
pub mod error;
pub mod grid;
pub mod mics;
pub mod spectra;
pub mod steering;
pub mod time_data;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Re-exports for ergonomics
pub use beamformer::{
    Band, BeamformerCore, CaponBeamformer, ConventionalBeamformer, EigBeamformer,
    FunctionalBeamformer, MusicBeamformer, SectorSpectrum, SourceEstimator, SourceMap,
};
pub use calib::Calib;
pub use environment::Environment;
pub use error::{AcousticError, AcousticResult};
pub use grid::{FocusGrid, Rect};
pub use mics::MicArray;
pub use spectra::{Overlap, PowerSpectra, Window};
pub use steering::{SteerKind, SteeringVector};
pub use time_data::TimeRecords;

/// Shared handle to a pipeline stage. Stages are owned by the registry for
/// the lifetime of the session; handles are cloned into downstream stages.
pub type Shared<T> = Arc<RwLock<T>>;

pub fn share<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Lock helpers that ride through poisoning: a panicked writer leaves the
/// stage in whatever state it reached, which the single-writer discipline
/// keeps consistent.
pub fn read_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

pub fn write_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
