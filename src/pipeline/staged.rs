//! Staged pipeline driver.
//!
//! Each stage runs as its own tokio task and owns its state outright:
//! the extractor owns the ring, the respond stage owns the kernels, the
//! classify stage owns the threshold. Stages are joined by bounded
//! single-producer, single-consumer queues, so a slow consumer suspends
//! its producer and backpressure reaches the input sender.
//!
//! Closing the input is the cancellation signal. Stages drain what they
//! hold and exit in order; a frame that was only partly received is
//! dropped by the assembler and never emitted.

use super::edge_map::EdgeMap;
use super::framing::FrameTracker;
use super::DetectionError;
use crate::classify::ThresholdClassifier;
use crate::compass::{CompassEngine, CompassResponse};
use crate::config::{ConfigError, DetectorConfig};
use crate::source::{EdgeDecision, GrayFrame, GrayPixel};
use crate::window::{Window, WindowExtractor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type StageResult = Result<(), DetectionError>;

/// Concurrent extract, respond, classify and assemble stages.
///
/// Must be spawned from within a tokio runtime.
pub struct StagedPipeline {
    input: Option<mpsc::Sender<GrayPixel>>,
    frames: mpsc::Receiver<EdgeMap>,
    stages: Vec<(&'static str, JoinHandle<StageResult>)>,
}

impl StagedPipeline {
    /// Validates the configuration and spawns the stage tasks.
    pub fn spawn(config: &DetectorConfig, queue_depth: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        if queue_depth == 0 {
            return Err(ConfigError::InvalidQueueDepth);
        }

        let (pixel_tx, pixel_rx) = mpsc::channel(queue_depth);
        let (window_tx, window_rx) = mpsc::channel(queue_depth);
        let (response_tx, response_rx) = mpsc::channel(queue_depth);
        let (decision_tx, decision_rx) = mpsc::channel(queue_depth);
        let (frame_tx, frame_rx) = mpsc::channel(queue_depth);

        let extractor = WindowExtractor::new(config)?;
        let tracker = FrameTracker::new(config.pixel_count());
        let engine = CompassEngine::new(&config.kernels)?;
        let classifier = ThresholdClassifier::new(config.threshold);

        let stages = vec![
            (
                "extract",
                tokio::spawn(extract_stage(extractor, tracker, pixel_rx, window_tx)),
            ),
            (
                "respond",
                tokio::spawn(respond_stage(engine, window_rx, response_tx)),
            ),
            (
                "classify",
                tokio::spawn(classify_stage(classifier, response_rx, decision_tx)),
            ),
            (
                "assemble",
                tokio::spawn(assemble_stage(
                    config.width,
                    config.height,
                    decision_rx,
                    frame_tx,
                )),
            ),
        ];

        info!(
            width = config.width,
            height = config.height,
            queue_depth,
            "Staged pipeline spawned"
        );

        Ok(Self {
            input: Some(pixel_tx),
            frames: frame_rx,
            stages,
        })
    }

    /// Clone of the input sender, or `None` once the input is closed.
    ///
    /// The input only closes when every clone has been dropped.
    pub fn sender(&self) -> Option<mpsc::Sender<GrayPixel>> {
        self.input.clone()
    }

    /// Sends one pixel, waiting while the input queue is full.
    ///
    /// Fails once the extract stage has stopped; `join` reports why.
    pub async fn send(&self, pixel: GrayPixel) -> Result<(), DetectionError> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| DetectionError::StageFailed("input already closed".to_string()))?;
        input
            .send(pixel)
            .await
            .map_err(|_| DetectionError::StageFailed("extract stage stopped".to_string()))
    }

    /// Sends every pixel of a frame, marker on the last.
    pub async fn send_frame(&self, frame: &GrayFrame) -> Result<(), DetectionError> {
        for pixel in frame.records() {
            self.send(pixel).await?;
        }
        Ok(())
    }

    /// Closes the input queue, starting shutdown.
    pub fn close_input(&mut self) {
        if self.input.take().is_some() {
            debug!("Staged pipeline input closed");
        }
    }

    /// Waits for the next complete frame.
    ///
    /// Returns `None` once every stage has exited.
    pub async fn next_frame(&mut self) -> Option<EdgeMap> {
        self.frames.recv().await
    }

    /// Closes the input and waits for every stage to exit.
    ///
    /// Frames not yet taken with `next_frame` are discarded. The first
    /// stage error is returned; a panicked or aborted task is reported as
    /// `StageFailed`.
    pub async fn join(mut self) -> Result<(), DetectionError> {
        self.close_input();
        self.frames.close();

        let mut result = Ok(());
        for (name, handle) in self.stages {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DetectionError::StageFailed(format!("{name}: {e}"))),
            };
            if let Err(e) = outcome {
                if result.is_ok() {
                    result = Err(e);
                } else {
                    debug!(stage = name, error = %e, "Further stage error");
                }
            }
        }
        result
    }
}

impl std::fmt::Debug for StagedPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedPipeline")
            .field("input_open", &self.input.is_some())
            .field("stages", &self.stages.len())
            .finish()
    }
}

async fn extract_stage(
    mut extractor: WindowExtractor,
    mut tracker: FrameTracker,
    mut input: mpsc::Receiver<GrayPixel>,
    output: mpsc::Sender<Window>,
) -> StageResult {
    debug!("Extract stage started");

    while let Some(pixel) = input.recv().await {
        let closes_frame = tracker.advance(pixel.end_of_frame).map_err(|e| {
            warn!(error = %e, "Framing error, stopping pipeline");
            e
        })?;

        if let Some(window) = extractor.push(pixel.intensity) {
            if output.send(window).await.is_err() {
                debug!("Respond stage gone, extract stage exiting");
                return Ok(());
            }
        }

        if closes_frame {
            let tail: Vec<Window> = extractor.flush().collect();
            extractor.reset();
            for window in tail {
                if output.send(window).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    if let Err(e) = tracker.finish() {
        warn!(error = %e, "Input closed mid-frame");
        return Err(e.into());
    }

    debug!(frames = tracker.completed(), "Extract stage finished");
    Ok(())
}

async fn respond_stage(
    engine: CompassEngine,
    mut input: mpsc::Receiver<Window>,
    output: mpsc::Sender<(Window, CompassResponse)>,
) -> StageResult {
    while let Some(window) = input.recv().await {
        let response = engine.respond(&window).map_err(|e| {
            warn!(error = %e, "Response overflow, stopping pipeline");
            e
        })?;
        if output.send((window, response)).await.is_err() {
            return Ok(());
        }
    }
    debug!("Respond stage finished");
    Ok(())
}

async fn classify_stage(
    classifier: ThresholdClassifier,
    mut input: mpsc::Receiver<(Window, CompassResponse)>,
    output: mpsc::Sender<EdgeDecision>,
) -> StageResult {
    while let Some((window, response)) = input.recv().await {
        let decision = EdgeDecision {
            edge: classifier.decide(&window, &response),
            end_of_frame: window.end_of_frame(),
        };
        if output.send(decision).await.is_err() {
            return Ok(());
        }
    }
    debug!("Classify stage finished");
    Ok(())
}

async fn assemble_stage(
    width: u32,
    height: u32,
    mut input: mpsc::Receiver<EdgeDecision>,
    output: mpsc::Sender<EdgeMap>,
) -> StageResult {
    let frame_len = width as usize * height as usize;
    let mut edges = Vec::with_capacity(frame_len);
    let mut sequence = 0u64;

    while let Some(decision) = input.recv().await {
        edges.push(decision.edge);
        if !decision.end_of_frame {
            continue;
        }

        sequence += 1;
        let frame = std::mem::replace(&mut edges, Vec::with_capacity(frame_len));
        let map = EdgeMap::from_edges(frame, width, height, sequence);

        info!(
            frame = sequence,
            edges = map.edge_count(),
            density = format!("{:.4}", map.density()),
            "Frame complete"
        );

        if output.send(map).await.is_err() {
            debug!("Frame receiver gone, assemble stage exiting");
            return Ok(());
        }
    }

    if !edges.is_empty() {
        warn!(received = edges.len(), expected = frame_len, "Discarding partial frame");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FramingError, PipelineDriver};
    use crate::source::Pattern;

    fn frame_of(pattern: Pattern, sequence: u64) -> GrayFrame {
        GrayFrame::new(pattern.render(8, 8), 8, 8, sequence)
    }

    #[tokio::test]
    async fn test_matches_synchronous_driver() {
        let config = DetectorConfig::with_dimensions(8, 8);
        let frames = [
            frame_of(Pattern::reference_square(), 0),
            frame_of(Pattern::HorizontalRamp, 1),
            frame_of(Pattern::Checkerboard { cell: 2 }, 2),
        ];

        let mut sync = PipelineDriver::new(&config).unwrap();
        let mut staged = StagedPipeline::spawn(&config, 4).unwrap();

        for frame in &frames {
            staged.send_frame(frame).await.unwrap();
            let map = staged.next_frame().await.unwrap();
            let expected = sync.process_frame(frame).unwrap();
            assert_eq!(map.edges(), expected.edges());
            assert_eq!(map.digest(), expected.digest());
        }

        staged.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_mid_frame_emits_nothing() {
        let config = DetectorConfig::with_dimensions(8, 8);
        let mut staged = StagedPipeline::spawn(&config, 8).unwrap();

        for _ in 0..40 {
            staged.send(GrayPixel::new(255)).await.unwrap();
        }
        staged.close_input();

        assert!(staged.next_frame().await.is_none());
        assert_eq!(
            staged.join().await,
            Err(DetectionError::Framing(FramingError::Truncated {
                received: 40,
                expected: 64
            }))
        );
    }

    #[tokio::test]
    async fn test_close_at_boundary_is_clean() {
        let config = DetectorConfig::with_dimensions(8, 8);
        let mut staged = StagedPipeline::spawn(&config, 2).unwrap();

        staged.send_frame(&frame_of(Pattern::Flat { level: 7 }, 0)).await.unwrap();
        staged.close_input();

        let map = staged.next_frame().await.unwrap();
        assert_eq!(map.edge_count(), 0);
        assert!(staged.next_frame().await.is_none());
        assert!(staged.join().await.is_ok());
    }

    #[tokio::test]
    async fn test_framing_error_reported_on_join() {
        let config = DetectorConfig::with_dimensions(8, 8);
        let staged = StagedPipeline::spawn(&config, 16).unwrap();

        for _ in 0..10 {
            staged.send(GrayPixel::new(0)).await.unwrap();
        }
        staged.send(GrayPixel::last(0)).await.unwrap();

        assert_eq!(
            staged.join().await,
            Err(DetectionError::Framing(FramingError::PrematureMarker {
                index: 10,
                expected: 63
            }))
        );
    }

    #[tokio::test]
    async fn test_zero_queue_depth_rejected() {
        let config = DetectorConfig::with_dimensions(8, 8);
        assert_eq!(
            StagedPipeline::spawn(&config, 0).unwrap_err(),
            ConfigError::InvalidQueueDepth
        );
    }
}
