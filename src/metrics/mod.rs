//! Prometheus metrics for edge detection runs.
//!
//! # Metrics Exposed
//!
//! - `compass_edge_frames_total` - Frames completed
//! - `compass_edge_pixels_total` - Edge decisions emitted
//! - `compass_edge_edges_total` - Decisions classified as edges
//! - `compass_edge_framing_errors_total` - Frames abandoned on framing errors
//! - `compass_edge_overflow_errors_total` - Frames abandoned on response overflow
//! - `compass_edge_last_frame_edges` - Edge pixels in the last frame
//! - `compass_edge_last_frame_density` - Edge density of the last frame
//!
//! With the `metrics` feature an HTTP server exposes the registry on
//! `/metrics` alongside a `/health` probe.
//!
//! # Example
//!
//! ```no_run
//! use compass_edge::config::DetectorConfig;
//! use compass_edge::metrics::{MetricsRegistry, MetricsSnapshot};
//! use compass_edge::pipeline::PipelineDriver;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let driver = PipelineDriver::new(&DetectorConfig::with_dimensions(64, 64)).unwrap();
//!
//! registry.update(&MetricsSnapshot::from_stats(driver.stats()));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
