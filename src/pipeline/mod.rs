//! Pipeline drivers.
//!
//! Sequences window extraction, compass responses and classification over
//! a pixel stream, one decision per pixel in input order.
//!
//! ```text
//! GrayPixel → extract → respond → classify → EdgeDecision → EdgeMap
//! ```
//!
//! [`PipelineDriver`] runs the stages as one synchronous pass. With the
//! `staged` feature, [`StagedPipeline`] runs each stage as its own tokio
//! task joined by bounded queues.

mod driver;
mod edge_map;
mod framing;
#[cfg(feature = "staged")]
mod staged;

pub use driver::{DetectorStats, DriverState, PipelineDriver};
pub use edge_map::EdgeMap;
pub use framing::{FrameTracker, FramingError};
#[cfg(feature = "staged")]
pub use staged::StagedPipeline;

use crate::compass::OverflowError;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced while detecting edges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    /// The detector could not be configured.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The input violated frame boundaries.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// A response left the representable range.
    #[error("response overflow: {0}")]
    Overflow(#[from] OverflowError),

    /// A staged task panicked or was aborted.
    #[error("pipeline stage failed: {0}")]
    StageFailed(String),
}
