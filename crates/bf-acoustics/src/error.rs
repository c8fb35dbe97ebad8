//! Error types for acoustic processing stages.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for acoustic operations.
pub type AcousticResult<T> = Result<T, AcousticError>;

/// Errors that can occur while loading stage inputs or computing maps.
#[derive(Error, Debug)]
pub enum AcousticError {
    #[error("Failed to read {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed {what} file {path}: {message}")]
    Malformed {
        what: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("Audio decode error: {0}")]
    Audio(#[from] hound::Error),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("No data: {what}")]
    NoData { what: &'static str },

    #[error("Channel count mismatch: {time_channels} time channels vs {mic_channels} microphones")]
    ChannelMismatch {
        time_channels: usize,
        mic_channels: usize,
    },

    #[error("Cross-spectral matrix is singular at {freq_hz} Hz")]
    SingularCsm { freq_hz: f64 },

    #[error(transparent)]
    Core(#[from] bf_core::BfError),
}
