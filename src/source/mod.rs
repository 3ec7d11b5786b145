//! Grayscale pixel sources.
//!
//! The detector consumes single-channel intensity records. This module
//! provides the record types, a frame container, and a trait-based
//! abstraction over where frames come from: synthetic test patterns or
//! image files decoded to 8-bit luma. Color conversion is left to the
//! `image` crate.

mod frame;
mod image_file;
mod pattern;
mod record;

pub use frame::GrayFrame;
pub use image_file::ImageFileSource;
pub use pattern::{Pattern, PatternSource};
pub use record::{tag_frame, EdgeDecision, GrayPixel};

use crate::config::DetectorConfig;
use thiserror::Error;

/// Errors that can occur while producing frames.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open source: {0}")]
    OpenFailed(String),
    #[error("invalid detector configuration: {0}")]
    ConfigFailed(String),
    #[error("frame is {actual_width}x{actual_height}, detector expects {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("source not initialized")]
    NotInitialized,
}

/// Trait for frame producers feeding the detector.
///
/// Mirrors the lifecycle of a capture device so that synthetic and
/// file-backed sources are interchangeable.
pub trait PixelSource {
    /// Prepares the source for frames matching the detector geometry.
    fn open(&mut self, config: &DetectorConfig) -> Result<(), SourceError>;

    /// Produces the next frame.
    fn capture(&mut self) -> Result<GrayFrame, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Releases the source.
    fn close(&mut self);
}
