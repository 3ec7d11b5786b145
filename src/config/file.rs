//! TOML configuration file format.

use super::{ConfigError, DetectorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Detector geometry, threshold and kernels.
    #[serde(default)]
    pub detector: DetectorConfig,
    /// Driver selection.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// CLI output and metrics.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Execution model of the pipeline driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run stages as concurrent tasks (true) or as one synchronous pass (false).
    pub staged: bool,
    /// Capacity of each inter-stage queue when staged.
    pub queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staged: false,
            queue_depth: 64,
        }
    }
}

impl PipelineConfig {
    /// Validates the pipeline parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_depth == 0 {
            return Err(ConfigError::InvalidQueueDepth);
        }
        Ok(())
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print the edge map as ASCII after each frame.
    pub render: bool,
    /// Number of frames to process.
    pub frame_count: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            render: true,
            frame_count: 1,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.detector.validate()?;
        config.pipeline.validate()?;
        Ok(config)
    }
}
