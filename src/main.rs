//! Compass Edge Detection CLI
//!
//! Runs an image file or a built-in test pattern through the detector and
//! prints the edge map, a per-frame summary and the frame digest.

use clap::{Args, Parser, Subcommand, ValueEnum};
use compass_edge::{
    config::{ConfigError, FileConfig},
    metrics::MetricsError,
    pipeline::{DetectionError, DetectorStats, EdgeMap, PipelineDriver},
    source::{ImageFileSource, Pattern, PatternSource, PixelSource, SourceError},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "compass-edge")]
#[command(version)]
#[command(about = "Streaming compass-gradient edge detector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect edges in an image file or a synthetic pattern
    Detect(DetectArgs),

    /// Print the default configuration as TOML
    Config,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Image file to decode (PNG or PGM); overrides --pattern
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Built-in pattern used when no input file is given
    #[arg(short, long, value_enum, default_value_t = PatternArg::Square)]
    pattern: PatternArg,

    /// Path to config file (TOML format)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Frame width (defaults to the image or config width)
    #[arg(long)]
    width: Option<u32>,

    /// Frame height (defaults to the image or config height)
    #[arg(long)]
    height: Option<u32>,

    /// Edge threshold
    #[arg(short, long)]
    threshold: Option<u16>,

    /// Neighborhood extent (odd)
    #[arg(long)]
    extent: Option<u32>,

    /// Run stages as concurrent tasks joined by bounded queues
    #[arg(long)]
    staged: bool,

    /// Capacity of each inter-stage queue
    #[arg(long = "queue-depth")]
    queue_depth: Option<usize>,

    /// Number of frames to process
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Skip printing the edge map
    #[arg(long = "no-render")]
    no_render: bool,

    /// Serve Prometheus metrics on this port (0 disables)
    #[arg(long = "metrics-port")]
    metrics_port: Option<u16>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    /// 8x8 reference square (0xFF at rows 1-4, columns 3-6)
    Square,
    /// Left-to-right intensity ramp
    Ramp,
    /// 4-pixel checkerboard
    Checker,
    /// Uniform mid-gray
    Flat,
}

impl PatternArg {
    fn pattern(self) -> Pattern {
        match self {
            PatternArg::Square => Pattern::reference_square(),
            PatternArg::Ramp => Pattern::HorizontalRamp,
            PatternArg::Checker => Pattern::Checkerboard { cell: 4 },
            PatternArg::Flat => Pattern::Flat { level: 0x80 },
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("{0}")]
    Unsupported(&'static str),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect(args) => detect(args),
        Commands::Config => print_default_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_default_config() -> Result<(), CliError> {
    print!("{}", toml::to_string_pretty(&FileConfig::default())?);
    Ok(())
}

/// Resolved settings for one `detect` run.
struct Settings {
    file: FileConfig,
    render: bool,
}

fn load_settings(args: &DetectArgs) -> Result<Settings, CliError> {
    let mut file = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            FileConfig::from_file(path)?
        }
        None => FileConfig::default(),
    };

    let detector = &mut file.detector;
    if let Some(path) = &args.input {
        let (width, height) = ImageFileSource::probe(path)?;
        detector.width = width;
        detector.height = height;
    } else if args.config.is_none() && matches!(args.pattern, PatternArg::Square) {
        detector.width = 8;
        detector.height = 8;
    }
    if let Some(width) = args.width {
        detector.width = width;
    }
    if let Some(height) = args.height {
        detector.height = height;
    }
    if let Some(threshold) = args.threshold {
        detector.threshold = threshold;
    }
    if let Some(extent) = args.extent {
        detector.window_extent = extent;
    }
    if args.staged {
        file.pipeline.staged = true;
    }
    if let Some(depth) = args.queue_depth {
        file.pipeline.queue_depth = depth;
    }
    if let Some(frames) = args.frames {
        file.output.frame_count = frames;
    }
    if let Some(port) = args.metrics_port {
        file.output.metrics_port = port;
    }

    file.detector.validate()?;
    file.pipeline.validate()?;

    Ok(Settings {
        render: file.output.render && !args.no_render,
        file,
    })
}

fn open_source(args: &DetectArgs, settings: &Settings) -> Result<Box<dyn PixelSource>, CliError> {
    let mut source: Box<dyn PixelSource> = match &args.input {
        Some(path) => Box::new(ImageFileSource::new(path.clone())),
        None => Box::new(PatternSource::new(args.pattern.pattern())),
    };
    source.open(&settings.file.detector)?;
    Ok(source)
}

/// Prints frames and keeps the metrics endpoint current.
struct Reporter {
    render: bool,
    #[cfg(feature = "metrics")]
    server_state: Option<Arc<tokio::sync::RwLock<compass_edge::metrics::MetricsState>>>,
}

impl Reporter {
    fn frame(&self, map: &EdgeMap, stats: &DetectorStats) {
        if self.render {
            print!("{}", map.render());
        }
        println!(
            "frame {}: {}x{} edges={} density={:.2}% digest={}",
            map.sequence(),
            map.width(),
            map.height(),
            map.edge_count(),
            map.density() * 100.0,
            map.digest().to_hex()
        );
        self.publish(stats);
    }

    #[cfg(feature = "metrics")]
    fn publish(&self, stats: &DetectorStats) {
        use compass_edge::metrics::MetricsSnapshot;

        if let Some(state) = &self.server_state {
            // Snapshots are cumulative, so a skipped update is caught up by the next one.
            match state.try_write() {
                Ok(mut guard) => guard.update(&MetricsSnapshot::from_stats(stats)),
                Err(_) => tracing::trace!("Metrics state busy, deferring update"),
            }
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn publish(&self, _stats: &DetectorStats) {}
}

fn detect(args: DetectArgs) -> Result<(), CliError> {
    info!("Compass Edge v{}", compass_edge::VERSION);

    let settings = load_settings(&args)?;
    let mut source = open_source(&args, &settings)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        warn!("Interrupt received, closing input");
        flag.store(false, Ordering::SeqCst);
    })?;

    let needs_runtime = settings.file.pipeline.staged || settings.file.output.metrics_port != 0;

    let outcome = if needs_runtime {
        run_with_runtime(&settings, source.as_mut(), &running)
    } else {
        let reporter = Reporter {
            render: settings.render,
            #[cfg(feature = "metrics")]
            server_state: None,
        };
        run_sync(&settings, source.as_mut(), &running, &reporter)
    };

    source.close();
    outcome
}

fn run_sync(
    settings: &Settings,
    source: &mut dyn PixelSource,
    running: &AtomicBool,
    reporter: &Reporter,
) -> Result<(), CliError> {
    let mut driver = PipelineDriver::new(&settings.file.detector)?;

    for _ in 0..settings.file.output.frame_count {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let frame = source.capture()?;
        match driver.process_frame(&frame) {
            Ok(map) => reporter.frame(&map, driver.stats()),
            Err(e) => {
                reporter.publish(driver.stats());
                return Err(e.into());
            }
        }
    }

    info!(
        frames = driver.stats().frames,
        edges = driver.stats().edges,
        "Detection finished"
    );
    Ok(())
}

#[cfg(not(feature = "staged"))]
fn run_with_runtime(
    _settings: &Settings,
    _source: &mut dyn PixelSource,
    _running: &AtomicBool,
) -> Result<(), CliError> {
    Err(CliError::Unsupported(
        "built without the `staged` feature; staged execution and metrics are unavailable",
    ))
}

#[cfg(feature = "staged")]
fn run_with_runtime(
    settings: &Settings,
    source: &mut dyn PixelSource,
    running: &AtomicBool,
) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    #[cfg(feature = "metrics")]
    let (server_state, shutdown) = start_metrics_server(&runtime, settings)?;
    #[cfg(not(feature = "metrics"))]
    if settings.file.output.metrics_port != 0 {
        warn!("Built without the `metrics` feature, ignoring metrics port");
    }

    let reporter = Reporter {
        render: settings.render,
        #[cfg(feature = "metrics")]
        server_state,
    };

    let result = if settings.file.pipeline.staged {
        runtime.block_on(run_staged(settings, source, running, &reporter))
    } else {
        run_sync(settings, source, running, &reporter)
    };

    #[cfg(feature = "metrics")]
    if let Some(shutdown) = shutdown {
        if result.is_ok() {
            info!("Serving metrics until interrupted");
            while running.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
        let _ = shutdown.send(());
    }

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    result
}

#[cfg(feature = "metrics")]
type MetricsHandle = (
    Option<Arc<tokio::sync::RwLock<compass_edge::metrics::MetricsState>>>,
    Option<tokio::sync::oneshot::Sender<()>>,
);

#[cfg(feature = "metrics")]
fn start_metrics_server(
    runtime: &tokio::runtime::Runtime,
    settings: &Settings,
) -> Result<MetricsHandle, CliError> {
    use compass_edge::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    let port = settings.file.output.metrics_port;
    if port == 0 {
        return Ok((None, None));
    }

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), MetricsRegistry::new()?);
    let state = server.state();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    runtime.spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = server.run(shutdown).await {
            warn!(error = %e, "Metrics server failed");
        }
    });
    Ok((Some(state), Some(tx)))
}

#[cfg(feature = "staged")]
async fn run_staged(
    settings: &Settings,
    source: &mut dyn PixelSource,
    running: &AtomicBool,
    reporter: &Reporter,
) -> Result<(), CliError> {
    use compass_edge::pipeline::{FramingError, StagedPipeline};

    let mut pipeline =
        StagedPipeline::spawn(&settings.file.detector, settings.file.pipeline.queue_depth)?;
    let mut stats = DetectorStats::default();
    let mut cancelled = false;

    'frames: for _ in 0..settings.file.output.frame_count {
        let frame = source.capture()?;
        for pixel in frame.records() {
            if !running.load(Ordering::SeqCst) {
                pipeline.close_input();
                cancelled = true;
                break 'frames;
            }
            if pipeline.send(pixel).await.is_err() {
                break 'frames;
            }
        }
        match pipeline.next_frame().await {
            Some(map) => {
                stats.record_frame(&map);
                reporter.frame(&map, &stats);
            }
            None => break,
        }
    }

    match pipeline.join().await {
        Ok(()) => {
            info!(frames = stats.frames, edges = stats.edges, "Detection finished");
            Ok(())
        }
        Err(DetectionError::Framing(FramingError::Truncated { received, expected }))
            if cancelled =>
        {
            info!(received, expected, "Cancelled, partial frame discarded");
            Ok(())
        }
        Err(e) => {
            stats.record_error(&e);
            reporter.publish(&stats);
            Err(e.into())
        }
    }
}
