//! Detector, pipeline and output configuration.
//!
//! Configuration is fixed at instantiation. It can be built in code or
//! loaded from a TOML file whose sections all fall back to defaults.

mod detector;
mod file;

pub use detector::{ConfigError, DetectorConfig, DEFAULT_THRESHOLD, DEFAULT_WINDOW_EXTENT};
pub use file::{FileConfig, OutputConfig, PipelineConfig};
