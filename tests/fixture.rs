//! 8x8 regression image: a 0xFF square at rows 1-4, columns 3-6.

use compass_edge::config::{DetectorConfig, FileConfig};
use compass_edge::pipeline::{EdgeMap, PipelineDriver};
use compass_edge::source::{tag_frame, Pattern, PatternSource, PixelSource};

const EXPECTED: [&str; 8] = [
    "0 0 0 0 0 0 0 0",
    "0 0 1 1 1 1 1 0",
    "0 0 1 1 0 0 1 0",
    "0 0 1 1 0 0 1 0",
    "0 0 1 1 1 1 1 0",
    "0 0 1 1 1 1 1 0",
    "0 0 0 0 0 0 0 0",
    "0 0 0 0 0 0 0 0",
];

fn square() -> Vec<u8> {
    Pattern::reference_square().render(8, 8)
}

fn assert_fixture(map: &EdgeMap) {
    let rendered = map.render();
    let rows: Vec<&str> = rendered.lines().collect();
    assert_eq!(rows, EXPECTED, "edge map:\n{rendered}");
}

#[test]
fn test_fixture_through_pixel_stream() {
    let config = DetectorConfig::with_dimensions(8, 8);
    let mut driver = PipelineDriver::new(&config).unwrap();

    let decisions = driver.run(tag_frame(&square())).unwrap();
    assert_eq!(decisions.len(), 64);
    assert!(decisions[63].end_of_frame);

    assert_fixture(&EdgeMap::from_decisions(&decisions, 8, 8, 1));
}

#[test]
fn test_fixture_through_pattern_source() {
    let config = DetectorConfig::with_dimensions(8, 8);
    let mut source = PatternSource::new(Pattern::reference_square());
    source.open(&config).unwrap();

    let mut driver = PipelineDriver::new(&config).unwrap();
    for _ in 0..3 {
        let frame = source.capture().unwrap();
        assert_fixture(&driver.process_frame(&frame).unwrap());
    }
    assert_eq!(driver.stats().frames, 3);
    assert_eq!(driver.stats().edges, 63);
    source.close();
}

#[test]
fn test_fixture_from_toml_config() {
    let config = FileConfig::from_toml_str(
        r#"
        [detector]
        width = 8
        height = 8
        window_extent = 5
        threshold = 500
        "#,
    )
    .unwrap();

    let mut driver = PipelineDriver::new(&config.detector).unwrap();
    let decisions = driver.run(tag_frame(&square())).unwrap();
    assert_fixture(&EdgeMap::from_decisions(&decisions, 8, 8, 1));
}

#[test]
fn test_fixture_with_wider_window() {
    let mut config = DetectorConfig::with_dimensions(8, 8);
    config.window_extent = 7;

    let mut driver = PipelineDriver::new(&config).unwrap();
    let decisions = driver.run(tag_frame(&square())).unwrap();
    assert_fixture(&EdgeMap::from_decisions(&decisions, 8, 8, 1));
}

#[test]
fn test_fixture_digest_is_stable_across_drivers() {
    let config = DetectorConfig::with_dimensions(8, 8);
    let a = PipelineDriver::new(&config)
        .unwrap()
        .run(tag_frame(&square()))
        .unwrap();
    let b = PipelineDriver::new(&config)
        .unwrap()
        .run(tag_frame(&square()))
        .unwrap();

    assert_eq!(
        EdgeMap::from_decisions(&a, 8, 8, 1).digest(),
        EdgeMap::from_decisions(&b, 8, 8, 2).digest()
    );
}

#[test]
fn test_high_threshold_clears_fixture() {
    let config = DetectorConfig::with_dimensions(8, 8).with_threshold(2041);
    let mut driver = PipelineDriver::new(&config).unwrap();

    let decisions = driver.run(tag_frame(&square())).unwrap();
    assert!(decisions.iter().all(|d| !d.edge));
}

#[cfg(feature = "staged")]
#[tokio::test]
async fn test_fixture_through_staged_pipeline() {
    use compass_edge::pipeline::StagedPipeline;
    use compass_edge::source::GrayFrame;

    let config = DetectorConfig::with_dimensions(8, 8);
    let mut pipeline = StagedPipeline::spawn(&config, 3).unwrap();

    pipeline
        .send_frame(&GrayFrame::new(square(), 8, 8, 1))
        .await
        .unwrap();
    let map = pipeline.next_frame().await.unwrap();
    assert_fixture(&map);

    pipeline.join().await.unwrap();
}
