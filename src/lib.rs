//! Compass Edge Detection Library
//!
//! A streaming, window-based edge detector. Grayscale pixels arrive one at
//! a time in row-major order with an end-of-frame marker on the last pixel
//! of each frame; every pixel leaves as a single edge bit.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! source → window → compass → classify
//!    ↓                            ↓
//!          pipeline (driver, framing, edge maps)
//! ```
//!
//! - **window**: rebuilds N×N neighborhoods from the 1-D stream with a ring
//!   of the last N rows
//! - **compass**: four directional gradient responses per window, checked
//!   against a 12-bit signed range
//! - **classify**: symmetric threshold over the four responses
//! - **pipeline**: synchronous and staged drivers that keep order and
//!   frame markers intact
//!
//! # Design Principles
//!
//! - **No whole-frame buffering**: only N rows are ever held
//! - **Fail loudly**: framing and overflow errors abandon the frame, never
//!   emit a guess
//! - **Deterministic**: identical input gives bit-identical output
//!
//! # Example
//!
//! ```no_run
//! use compass_edge::{
//!     config::DetectorConfig,
//!     pipeline::PipelineDriver,
//!     source::{Pattern, PatternSource, PixelSource},
//! };
//!
//! let config = DetectorConfig::with_dimensions(8, 8);
//!
//! let mut source = PatternSource::new(Pattern::reference_square());
//! source.open(&config).unwrap();
//!
//! let mut driver = PipelineDriver::new(&config).unwrap();
//! let frame = source.capture().unwrap();
//! let map = driver.process_frame(&frame).unwrap();
//!
//! print!("{}", map.render());
//! println!("digest {}", map.digest());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod classify;
pub mod compass;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod window;

// Re-export commonly used types at crate root
pub use classify::ThresholdClassifier;
pub use compass::{CompassEngine, CompassResponse, Direction, KernelSet, OverflowError};
pub use config::{ConfigError, DetectorConfig, FileConfig};
pub use pipeline::{DetectionError, EdgeMap, FramingError, PipelineDriver};
#[cfg(feature = "staged")]
pub use pipeline::StagedPipeline;
pub use source::{EdgeDecision, GrayFrame, GrayPixel, PixelSource};
pub use window::{Window, WindowExtractor};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
