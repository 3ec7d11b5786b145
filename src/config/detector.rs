//! Detector configuration.
//!
//! Everything here is fixed at instantiation: the frame geometry, the
//! neighborhood extent, the threshold and the kernel set. Validation runs
//! before any pixel is processed so that geometry mistakes surface as
//! `ConfigError` rather than as framing or overflow failures mid-frame.

use crate::compass::{KernelSet, RESPONSE_MAX};
use serde::{Deserialize, Serialize};

/// Default neighborhood extent (pixels per side).
pub const DEFAULT_WINDOW_EXTENT: u32 = 5;

/// Default edge threshold for 8-bit intensities and the compass kernels.
pub const DEFAULT_THRESHOLD: u16 = 500;

/// Configuration for one detector instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Side of the square neighborhood buffered per pixel.
    pub window_extent: u32,
    /// Minimum response magnitude classified as an edge.
    pub threshold: u16,
    /// The four directional kernels.
    pub kernels: KernelSet,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            window_extent: DEFAULT_WINDOW_EXTENT,
            threshold: DEFAULT_THRESHOLD,
            kernels: KernelSet::compass(),
        }
    }
}

impl DetectorConfig {
    /// Creates a default configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Returns a copy with a different threshold.
    pub fn with_threshold(mut self, threshold: u16) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of pixels in one frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Side of the kernel footprint.
    #[inline]
    pub fn kernel_extent(&self) -> usize {
        self.kernels.extent()
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.window_extent == 0 || self.window_extent % 2 == 0 {
            return Err(ConfigError::InvalidExtent(self.window_extent));
        }
        if self.window_extent > self.width || self.window_extent > self.height {
            return Err(ConfigError::ExtentExceedsImage {
                extent: self.window_extent,
                width: self.width,
                height: self.height,
            });
        }

        self.kernels.validate()?;

        let kernel = self.kernels.extent() as u32;
        if kernel > self.window_extent {
            return Err(ConfigError::KernelExceedsWindow {
                kernel,
                extent: self.window_extent,
            });
        }
        if i32::from(self.threshold) > RESPONSE_MAX {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("window extent {0} must be odd and non-zero")]
    InvalidExtent(u32),
    #[error("window extent {extent} exceeds frame {width}x{height}")]
    ExtentExceedsImage { extent: u32, width: u32, height: u32 },
    #[error("kernel footprint {kernel} exceeds window extent {extent}")]
    KernelExceedsWindow { kernel: u32, extent: u32 },
    #[error("{direction} kernel is not a square odd-sized matrix matching the set")]
    MalformedKernel { direction: &'static str },
    #[error("{direction} kernel worst-case response {worst_case} exceeds the {bits}-bit range")]
    KernelOutOfRange {
        direction: &'static str,
        worst_case: i32,
        bits: u32,
    },
    #[error("threshold {0} exceeds the representable response range")]
    InvalidThreshold(u16),
    #[error("queue depth must be at least 1")]
    InvalidQueueDepth,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
