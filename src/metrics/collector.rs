//! Metrics collection and registry.

use crate::pipeline::DetectorStats;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of detector state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames completed.
    pub frames: u64,
    /// Decisions emitted.
    pub pixels: u64,
    /// Edge decisions emitted.
    pub edges: u64,
    /// Frames abandoned on framing errors.
    pub framing_errors: u64,
    /// Frames abandoned on response overflow.
    pub overflow_errors: u64,
    /// Edge count of the last completed frame.
    pub last_frame_edges: u64,
    /// Edge density of the last completed frame.
    pub last_frame_density: f64,
}

impl MetricsSnapshot {
    /// Creates a snapshot from detector totals.
    pub fn from_stats(stats: &DetectorStats) -> Self {
        Self {
            frames: stats.frames,
            pixels: stats.pixels,
            edges: stats.edges,
            framing_errors: stats.framing_errors,
            overflow_errors: stats.overflow_errors,
            last_frame_edges: stats.last_frame_edges,
            last_frame_density: stats.last_frame_density,
        }
    }
}

/// Prometheus metrics registry for the edge detector.
pub struct MetricsRegistry {
    registry: Registry,

    // Throughput
    frames_total: IntCounter,
    pixels_total: IntCounter,
    edges_total: IntCounter,

    // Failures
    framing_errors_total: IntCounter,
    overflow_errors_total: IntCounter,

    // Last frame
    last_frame_edges: IntGauge,
    last_frame_density: Gauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all detector metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_total =
            IntCounter::new("compass_edge_frames_total", "Total frames completed")?;
        let pixels_total = IntCounter::new(
            "compass_edge_pixels_total",
            "Total edge decisions emitted",
        )?;
        let edges_total = IntCounter::new(
            "compass_edge_edges_total",
            "Total pixels classified as edges",
        )?;
        let framing_errors_total = IntCounter::new(
            "compass_edge_framing_errors_total",
            "Frames abandoned because the marker and pixel count disagreed",
        )?;
        let overflow_errors_total = IntCounter::new(
            "compass_edge_overflow_errors_total",
            "Frames abandoned because a response left the 12-bit range",
        )?;
        let last_frame_edges = IntGauge::new(
            "compass_edge_last_frame_edges",
            "Edge pixels in the last completed frame",
        )?;
        let last_frame_density = Gauge::new(
            "compass_edge_last_frame_density",
            "Fraction of edge pixels in the last completed frame",
        )?;

        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(pixels_total.clone()))?;
        registry.register(Box::new(edges_total.clone()))?;
        registry.register(Box::new(framing_errors_total.clone()))?;
        registry.register(Box::new(overflow_errors_total.clone()))?;
        registry.register(Box::new(last_frame_edges.clone()))?;
        registry.register(Box::new(last_frame_density.clone()))?;

        Ok(Self {
            registry,
            frames_total,
            pixels_total,
            edges_total,
            framing_errors_total,
            overflow_errors_total,
            last_frame_edges,
            last_frame_density,
        })
    }

    /// Updates all metrics from a snapshot.
    ///
    /// Counters only move forward; a snapshot behind the current value
    /// leaves them unchanged.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        advance(&self.frames_total, snapshot.frames);
        advance(&self.pixels_total, snapshot.pixels);
        advance(&self.edges_total, snapshot.edges);
        advance(&self.framing_errors_total, snapshot.framing_errors);
        advance(&self.overflow_errors_total, snapshot.overflow_errors);

        self.last_frame_edges.set(snapshot.last_frame_edges as i64);
        self.last_frame_density.set(snapshot.last_frame_density);
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            frames: 3,
            pixels: 192,
            edges: 42,
            framing_errors: 1,
            overflow_errors: 0,
            last_frame_edges: 21,
            last_frame_density: 0.328125,
        };
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("compass_edge_frames_total 3"));
        assert!(output.contains("compass_edge_pixels_total 192"));
        assert!(output.contains("compass_edge_framing_errors_total 1"));
        assert!(output.contains("compass_edge_last_frame_edges 21"));
    }

    #[test]
    fn test_counters_never_rewind() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&MetricsSnapshot {
            frames: 5,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            frames: 2,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("compass_edge_frames_total 5"));
    }

    #[test]
    fn test_snapshot_from_stats() {
        let stats = DetectorStats {
            frames: 2,
            pixels: 128,
            edges: 42,
            last_frame_edges: 21,
            last_frame_density: 21.0 / 64.0,
            ..Default::default()
        };
        let snapshot = MetricsSnapshot::from_stats(&stats);
        assert_eq!(snapshot.frames, 2);
        assert_eq!(snapshot.edges, 42);
        assert!((snapshot.last_frame_density - 0.328125).abs() < 1e-12);
    }
}
