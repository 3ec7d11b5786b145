//! Staged pipeline against the synchronous driver.

#![cfg(feature = "staged")]

use compass_edge::config::DetectorConfig;
use compass_edge::pipeline::{DetectionError, FramingError, PipelineDriver, StagedPipeline};
use compass_edge::source::{tag_frame, GrayFrame, GrayPixel, Pattern};
use proptest::prelude::*;
use proptest::strategy::ValueTree;
use proptest::test_runner::TestRunner;

/// Random intensities drawn from a fixed-seed runner.
fn noise(runner: &mut TestRunner, len: usize) -> Vec<u8> {
    prop::collection::vec(any::<u8>(), len)
        .new_tree(runner)
        .unwrap()
        .current()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_staged_matches_sync_across_frames() {
    let config = DetectorConfig::with_dimensions(24, 16);
    let mut runner = TestRunner::deterministic();
    let frames: Vec<GrayFrame> = vec![
        GrayFrame::new(Pattern::Checkerboard { cell: 3 }.render(24, 16), 24, 16, 1),
        GrayFrame::new(noise(&mut runner, 24 * 16), 24, 16, 2),
        GrayFrame::new(Pattern::HorizontalRamp.render(24, 16), 24, 16, 3),
        GrayFrame::new(noise(&mut runner, 24 * 16), 24, 16, 4),
    ];

    let mut sync = PipelineDriver::new(&config).unwrap();
    let expected: Vec<_> = frames
        .iter()
        .map(|f| sync.process_frame(f).unwrap())
        .collect();

    let mut staged = StagedPipeline::spawn(&config, 1).unwrap();
    let input = staged.sender().unwrap();
    let stream: Vec<GrayPixel> = frames.iter().flat_map(|f| f.records()).collect();
    let feeder = tokio::spawn(async move {
        for pixel in stream {
            input.send(pixel).await.unwrap();
        }
    });

    for (i, want) in expected.iter().enumerate() {
        let got = staged.next_frame().await.unwrap();
        assert_eq!(got.edges(), want.edges(), "frame {i}");
        assert_eq!(got.sequence(), i as u64 + 1);
    }

    feeder.await.unwrap();
    staged.join().await.unwrap();
}

#[tokio::test]
async fn test_cancel_mid_frame_discards_partial_frame() {
    let config = DetectorConfig::with_dimensions(8, 8);
    let mut staged = StagedPipeline::spawn(&config, 16).unwrap();

    let square = Pattern::reference_square().render(8, 8);
    staged
        .send_frame(&GrayFrame::new(square.clone(), 8, 8, 1))
        .await
        .unwrap();
    for pixel in tag_frame(&square).take(50) {
        staged.send(pixel).await.unwrap();
    }
    staged.close_input();

    assert!(staged.next_frame().await.is_some());
    assert!(staged.next_frame().await.is_none());
    assert_eq!(
        staged.join().await,
        Err(DetectionError::Framing(FramingError::Truncated {
            received: 50,
            expected: 64
        }))
    );
}

#[tokio::test]
async fn test_missing_marker_stops_pipeline() {
    let config = DetectorConfig::with_dimensions(8, 8);
    let mut staged = StagedPipeline::spawn(&config, 128).unwrap();

    for _ in 0..64 {
        staged.send(GrayPixel::new(3)).await.unwrap();
    }

    assert!(staged.next_frame().await.is_none());
    assert_eq!(
        staged.join().await,
        Err(DetectionError::Framing(FramingError::MissingMarker { index: 63 }))
    );
}
