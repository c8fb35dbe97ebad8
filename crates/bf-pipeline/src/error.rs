//! Error types for the pipeline glue layer.

use bf_acoustics::AcousticError;
use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Domain errors during compute/integrate; recovered by the trigger.
    #[error(transparent)]
    Acoustic(#[from] AcousticError),

    #[error(transparent)]
    Param(#[from] bf_core::BfError),

    #[error("Sector limit reached: at most {max} sectors")]
    SectorLimit { max: usize },

    #[error("A computation is already in flight")]
    ComputeBusy,
}
