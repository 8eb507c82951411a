//! Error types for APT batch decoding.
//!
//! Errors are split by blast radius: [`InvokeError`] belongs to a single
//! capture and never stops the batch, while [`BatchError`] and
//! [`ConfigError`] abort the whole run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all batch operations.
#[derive(Error, Debug)]
pub enum AptError {
    /// Decode tool launch errors
    #[error("Invoke error: {0}")]
    Invoke(#[from] InvokeError),

    /// Run-fatal batch errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures launching or talking to the external decode tool.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Decode tool '{program}' was not found")]
    NotFound { program: String },

    #[error("Failed to start decode tool '{program}': {source}")]
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to capture output of decode tool '{program}': {source}")]
    CaptureFailed {
        program: String,
        source: std::io::Error,
    },
}

/// Errors that stop the batch before or between captures.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to list input directory '{path}': {source}")]
    ListInputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid input pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to write progress output: {0}")]
    Report(std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file '{path}': {source}")]
    LoadFailed {
        path: Box<PathBuf>,
        source: std::io::Error,
    },

    #[error("Invalid config format in '{path}': {source}")]
    InvalidFormat {
        path: Box<PathBuf>,
        source: toml::de::Error,
    },

    #[error("Config validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to save config to '{path}': {source}")]
    SaveFailed {
        path: Box<PathBuf>,
        source: std::io::Error,
    },

    #[error("Config serialization failed: {source}")]
    SerializationFailed { source: toml::ser::Error },
}

/// Result type alias for batch operations
pub type Result<T, E = AptError> = std::result::Result<T, E>;

impl InvokeError {
    /// Name of the program the error refers to
    pub fn program(&self) -> &str {
        match self {
            InvokeError::NotFound { program }
            | InvokeError::SpawnFailed { program, .. }
            | InvokeError::CaptureFailed { program, .. } => program,
        }
    }

    /// Get suggested recovery action
    pub fn recovery_hint(&self) -> Option<&str> {
        match self {
            InvokeError::NotFound { .. } => {
                Some("Install noaa-apt or set [decoder] program to its full path")
            }
            InvokeError::SpawnFailed { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                Some("Check that the decode tool is executable")
            }
            _ => None,
        }
    }
}

impl BatchError {
    /// Directory the error refers to, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            BatchError::CreateOutputDir { path, .. } | BatchError::ListInputDir { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}
