//! Synchronous pipeline driver.

use super::edge_map::EdgeMap;
use super::framing::FrameTracker;
use super::DetectionError;
use crate::classify::ThresholdClassifier;
use crate::compass::{CompassEngine, OverflowError};
use crate::config::{ConfigError, DetectorConfig};
use crate::source::{EdgeDecision, GrayFrame, GrayPixel};
use crate::window::{Window, WindowExtractor};
use tracing::{debug, info, trace, warn};

/// Where the driver is within the per-pixel cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for the next pixel.
    AwaitingInput,
    /// A window is assembled and awaiting its responses.
    HaveWindow,
    /// A decision has been produced for the current window.
    EmitDecision,
    /// The end-of-frame decision has been emitted.
    FrameComplete,
}

/// Running totals across frames.
#[derive(Debug, Clone, Default)]
pub struct DetectorStats {
    /// Frames completed.
    pub frames: u64,
    /// Decisions emitted.
    pub pixels: u64,
    /// Decisions that were edges.
    pub edges: u64,
    /// Frames abandoned on a framing error.
    pub framing_errors: u64,
    /// Frames abandoned on a response overflow.
    pub overflow_errors: u64,
    /// Edge count of the last completed frame.
    pub last_frame_edges: u64,
    /// Edge density of the last completed frame.
    pub last_frame_density: f64,
}

impl DetectorStats {
    /// Folds a completed frame into the totals.
    pub fn record_frame(&mut self, map: &EdgeMap) {
        self.record_counts(map.len() as u64, map.edge_count() as u64);
    }

    /// Folds a completed frame given its decision and edge counts.
    pub fn record_counts(&mut self, pixels: u64, edges: u64) {
        self.frames += 1;
        self.pixels += pixels;
        self.edges += edges;
        self.last_frame_edges = edges;
        self.last_frame_density = edges as f64 / pixels.max(1) as f64;
    }

    /// Records an abandoned frame.
    pub fn record_error(&mut self, error: &DetectionError) {
        match error {
            DetectionError::Framing(_) => self.framing_errors += 1,
            DetectionError::Overflow(_) => self.overflow_errors += 1,
            _ => {}
        }
    }
}

/// Drives pixels through extraction, responses and classification in order.
///
/// Exactly one decision is emitted per input pixel, with the frame marker
/// on the same position as the input marker. An error abandons the frame
/// in progress; the next pixel starts a fresh frame.
#[derive(Debug)]
pub struct PipelineDriver {
    config: DetectorConfig,
    extractor: WindowExtractor,
    engine: CompassEngine,
    classifier: ThresholdClassifier,
    tracker: FrameTracker,
    state: DriverState,
    stats: DetectorStats,
    frame_pixels: u64,
    frame_edges: u64,
}

impl PipelineDriver {
    /// Creates a driver, validating the configuration.
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            width = config.width,
            height = config.height,
            extent = config.window_extent,
            kernel = config.kernel_extent(),
            threshold = config.threshold,
            "Pipeline driver ready"
        );

        Ok(Self {
            config: config.clone(),
            extractor: WindowExtractor::new(config)?,
            engine: CompassEngine::new(&config.kernels)?,
            classifier: ThresholdClassifier::new(config.threshold),
            tracker: FrameTracker::new(config.pixel_count()),
            state: DriverState::AwaitingInput,
            stats: DetectorStats::default(),
            frame_pixels: 0,
            frame_edges: 0,
        })
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Running totals.
    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    /// Pushes one pixel, appending any decisions that became available.
    ///
    /// Decisions lag the input by the extractor's lag within a frame and
    /// catch up when the end-of-frame pixel arrives.
    ///
    /// On `Err` the frame is abandoned. Decisions already appended to `out`
    /// for that frame stay there and none of them carries the marker;
    /// callers that must never see a partial frame use `run` or
    /// `process_frame`, which return only the error.
    pub fn push(
        &mut self,
        pixel: GrayPixel,
        out: &mut Vec<EdgeDecision>,
    ) -> Result<(), DetectionError> {
        if self.tracker.at_boundary() {
            self.state = DriverState::AwaitingInput;
            debug!(frame = self.tracker.completed() + 1, "Frame started");
        }

        let closes_frame = match self.tracker.advance(pixel.end_of_frame) {
            Ok(closes) => closes,
            Err(e) => return Err(self.abandon(e.into())),
        };

        if let Some(window) = self.extractor.push(pixel.intensity) {
            self.state = DriverState::HaveWindow;
            let decision = self.decide(&window).map_err(|e| self.abandon(e.into()))?;
            out.push(decision);
        }

        if closes_frame {
            let tail: Vec<Window> = self.extractor.flush().collect();
            for window in &tail {
                self.state = DriverState::HaveWindow;
                let decision = self.decide(window).map_err(|e| self.abandon(e.into()))?;
                out.push(decision);
            }
            self.complete_frame();
        } else {
            self.state = DriverState::AwaitingInput;
        }

        Ok(())
    }

    /// Checks the input ended on a frame boundary.
    ///
    /// A partial frame is discarded and reported as truncated.
    pub fn finish(&mut self) -> Result<(), DetectionError> {
        match self.tracker.finish() {
            Ok(()) => Ok(()),
            Err(e) => Err(self.abandon(e.into())),
        }
    }

    /// Runs a whole pixel stream and returns every decision.
    pub fn run<I>(&mut self, input: I) -> Result<Vec<EdgeDecision>, DetectionError>
    where
        I: IntoIterator<Item = GrayPixel>,
    {
        let mut out = Vec::new();
        for pixel in input {
            self.push(pixel, &mut out)?;
        }
        self.finish()?;
        Ok(out)
    }

    /// Runs one captured frame and collects its edge map.
    ///
    /// Any partial frame left by earlier `push` calls is discarded first.
    pub fn process_frame(&mut self, frame: &GrayFrame) -> Result<EdgeMap, DetectionError> {
        if !self.tracker.at_boundary() {
            debug!(
                received = self.tracker.position(),
                "Discarding partial frame"
            );
            self.reset_frame();
        }

        let mut out = Vec::with_capacity(frame.pixel_count());
        for pixel in frame.records() {
            self.push(pixel, &mut out)?;
        }
        self.finish()?;

        Ok(EdgeMap::from_decisions(
            &out,
            self.config.width,
            self.config.height,
            frame.sequence(),
        ))
    }

    /// Drops any partial frame and returns to `AwaitingInput`.
    pub fn reset_frame(&mut self) {
        self.extractor.reset();
        self.tracker.reset();
        self.frame_pixels = 0;
        self.frame_edges = 0;
        self.state = DriverState::AwaitingInput;
    }

    fn decide(&mut self, window: &Window) -> Result<EdgeDecision, OverflowError> {
        let response = self.engine.respond(window)?;
        let edge = self.classifier.decide(window, &response);
        self.state = DriverState::EmitDecision;

        self.frame_pixels += 1;
        if edge {
            self.frame_edges += 1;
        }
        trace!(index = window.index(), edge, "Decision");

        Ok(EdgeDecision {
            edge,
            end_of_frame: window.end_of_frame(),
        })
    }

    fn complete_frame(&mut self) {
        self.stats.record_counts(self.frame_pixels, self.frame_edges);

        info!(
            frame = self.stats.frames,
            edges = self.frame_edges,
            density = format!("{:.4}", self.stats.last_frame_density),
            "Frame complete"
        );

        self.extractor.reset();
        self.frame_pixels = 0;
        self.frame_edges = 0;
        self.state = DriverState::FrameComplete;
    }

    fn abandon(&mut self, error: DetectionError) -> DetectionError {
        warn!(error = %error, "Abandoning frame");
        self.stats.record_error(&error);
        self.reset_frame();
        error
    }
}
