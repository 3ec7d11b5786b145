use compass_edge::config::DetectorConfig;
use compass_edge::pipeline::PipelineDriver;
use compass_edge::source::{GrayFrame, Pattern};
use compass_edge::window::WindowExtractor;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_driver(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver");

    for &(width, height) in &[(64u32, 48u32), (320, 240), (640, 480)] {
        let config = DetectorConfig::with_dimensions(width, height);
        let frame = GrayFrame::new(
            Pattern::Checkerboard { cell: 8 }.render(width, height),
            width,
            height,
            1,
        );
        let mut driver = PipelineDriver::new(&config).unwrap();

        group.throughput(Throughput::Elements(config.pixel_count() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &frame,
            |b, frame| b.iter(|| driver.process_frame(black_box(frame)).unwrap()),
        );
    }

    group.finish();
}

fn bench_extractor(c: &mut Criterion) {
    let config = DetectorConfig::with_dimensions(640, 480);
    let pixels = Pattern::HorizontalRamp.render(640, 480);
    let mut extractor = WindowExtractor::new(&config).unwrap();

    let mut group = c.benchmark_group("extractor");
    group.throughput(Throughput::Elements(pixels.len() as u64));
    group.bench_function("640x480", |b| {
        b.iter(|| {
            extractor.reset();
            let mut count = 0usize;
            for &p in &pixels {
                count += usize::from(extractor.push(black_box(p)).is_some());
            }
            count + extractor.flush().count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_driver, bench_extractor);
criterion_main!(benches);
