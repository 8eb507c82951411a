//! Run configuration with TOML persistence.
//!
//! Every field defaults to the fixed layout the tool has always used, so a
//! missing config file changes nothing.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "APT_BATCH_CONFIG";

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory layout
    pub paths: PathsConfig,

    /// Decode tool invocation
    pub decoder: DecoderConfig,

    /// Batch report behaviour
    pub report: ReportConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Where captures are read from and images written to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for captures (not recursive)
    pub input_dir: PathBuf,

    /// Working directory of the decode tool
    pub working_dir: PathBuf,

    /// Image directory, relative to `input_dir`
    pub output_subdir: PathBuf,
}

/// Decode tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecoderConfig {
    /// Executable name or path
    pub program: String,

    /// Glob matched against file names in `input_dir`
    pub input_pattern: String,
}

/// How the decode tool's exit status feeds the batch report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatusPolicy {
    /// Non-zero exit marks the capture as failed
    #[default]
    Report,
    /// Every launched capture counts as completed
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub exit_status: ExitStatusPolicy,

    /// Write a one-line summary after the last capture
    pub print_summary: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics collection
    pub enabled: bool,

    /// Histogram precision (significant value digits)
    pub histogram_precision: u8,

    /// Maximum histogram value in milliseconds
    pub histogram_max_ms: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("/root/input"),
            working_dir: PathBuf::from("/root"),
            output_subdir: PathBuf::from("noaaAptOut"),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            program: "noaa-apt".to_string(),
            input_pattern: "*.wav".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            exit_status: ExitStatusPolicy::default(),
            print_summary: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_precision: 2,
            histogram_max_ms: 3_600_000,
        }
    }
}

impl PathsConfig {
    /// Resolved image directory
    pub fn output_dir(&self) -> PathBuf {
        self.input_dir.join(&self.output_subdir)
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: Box::new(path.to_path_buf()),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::InvalidFormat {
            path: Box::new(path.to_path_buf()),
            source,
        })
    }

    /// Load configuration, using defaults only when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Err(ConfigError::LoadFailed { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!("No config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::SaveFailed {
                path: Box::new(path.to_path_buf()),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|source| ConfigError::SerializationFailed { source })?;

        std::fs::write(path, contents).map_err(|source| ConfigError::SaveFailed {
            path: Box::new(path.to_path_buf()),
            source,
        })
    }

    /// Config file path: `$APT_BATCH_CONFIG` if set, else the platform config dir
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("apt-batch")
            .join("config.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decoder.program.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Decoder program must not be empty".to_string(),
            });
        }

        if self.decoder.input_pattern.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Input pattern must not be empty".to_string(),
            });
        }

        if let Err(e) = glob::Pattern::new(&self.decoder.input_pattern) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "Input pattern '{}' is not a valid glob: {}",
                    self.decoder.input_pattern, e
                ),
            });
        }

        // The image directory must stay inside the input directory
        let subdir = &self.paths.output_subdir;
        let nested = subdir.components().count() > 0
            && subdir
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !nested {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "Output subdirectory {:?} must be a relative path inside the input directory",
                    subdir
                ),
            });
        }

        if !(1..=5).contains(&self.metrics.histogram_precision) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "Histogram precision {} out of range 1-5",
                    self.metrics.histogram_precision
                ),
            });
        }

        if self.metrics.histogram_max_ms < 2 {
            return Err(ConfigError::ValidationFailed {
                reason: "Histogram max must be at least 2ms".to_string(),
            });
        }

        Ok(())
    }
}
