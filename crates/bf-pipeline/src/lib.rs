//! bf-pipeline: the reactive glue between processing stages and views.
//!
//! This crate owns the pattern the dashboard is built around:
//! - a [`registry::PipelineRegistry`] constructs the fixed stage graph,
//! - a [`catalog::VariantCatalog`] maps display names to beamformer
//!   variants and their control sets,
//! - the [`session::Session`] holds the active selection and display
//!   buffers with a single-writer discipline,
//! - the [`trigger::ComputeTrigger`] guards the recompute, which publishes
//!   whole frames atomically into the buffers,
//! - the [`sector::SectorSet`] keeps the derived spectrum display
//!   consistent with both the sector set and the source map.

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod registry;
pub mod sector;
pub mod session;
pub mod trigger;

pub use catalog::{ActiveSelection, EstimatorHandle, StageHandle, VariantCatalog, VariantEntry};
pub use config::{GridConfig, PipelineConfig};
pub use display::{MapFrame, SourceMapBuffer, SpectrumBuffer, SpectrumFrame, SpectrumSeries};
pub use error::{PipelineError, PipelineResult};
pub use registry::PipelineRegistry;
pub use sector::{PALETTE, Sector, SectorSet};
pub use session::{MapSettings, Session};
pub use trigger::{ComputeTrigger, MapRequest, compute_frame};
