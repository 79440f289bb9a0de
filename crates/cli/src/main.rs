use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;

use tray_count_core::camera::domain::camera::Camera;
use tray_count_core::camera::infrastructure::ffmpeg_camera::FfmpegCamera;
use tray_count_core::camera::infrastructure::image_dir_camera::ImageDirCamera;
use tray_count_core::camera::infrastructure::timeout_camera::TimeoutCamera;
use tray_count_core::detection::domain::detector_params::Polarity;
use tray_count_core::detection::infrastructure::threshold_blob_detector::ThresholdBlobDetector;
use tray_count_core::monitor::infrastructure::log_presenter::LogPresenter;
use tray_count_core::monitor::infrastructure::snapshot_presenter::SnapshotPresenter;
use tray_count_core::monitor::monitor_config::{parse_region, MonitorConfig};
use tray_count_core::monitor::monitor_logger::StdoutMonitorLogger;
use tray_count_core::monitor::presenter::MultiPresenter;
use tray_count_core::monitor::tray_monitor::TrayMonitor;

/// Counts items in tray compartments from a webcam and warns when one runs low.
#[derive(Parser)]
#[command(name = "tray-count")]
struct Cli {
    /// JSON config file (default: the per-user TrayCount/config.json, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture device: an index such as 0, or a device path/name.
    #[arg(long)]
    device: Option<String>,

    /// ffmpeg input format override (v4l2, avfoundation, dshow).
    #[arg(long)]
    input_format: Option<String>,

    /// Demuxer option passed to the capture device (KEY=VALUE, repeatable).
    #[arg(long = "capture-option", value_name = "KEY=VALUE")]
    capture_options: Vec<String>,

    /// Replay the images of a directory instead of opening a camera.
    #[arg(long, value_name = "DIR")]
    replay: Option<PathBuf>,

    /// Region to monitor (NAME=X,Y,WIDTH,HEIGHT, repeatable). Replaces the
    /// configured regions.
    #[arg(long = "region", value_name = "NAME=X,Y,W,H")]
    regions: Vec<String>,

    /// Alert when a region holds fewer items than this.
    #[arg(long)]
    low_threshold: Option<usize>,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long)]
    blur_kernel: Option<usize>,

    /// Intensity cutoff (0-255) between items and tray.
    #[arg(long)]
    cutoff: Option<u8>,

    /// Minimum blob area in pixels for an item to count.
    #[arg(long)]
    min_area: Option<f64>,

    /// Item polarity: dark (items darker than the tray) or light.
    #[arg(long)]
    polarity: Option<Polarity>,

    /// Give up when the camera delivers no frame within this many milliseconds.
    #[arg(long)]
    frame_timeout_ms: Option<u64>,

    /// Write annotated PNG snapshots to this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Font file (TTF/OTF) for the count and LOW! labels on snapshots.
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Snapshot every Nth frame.
    #[arg(long, default_value = "30")]
    snapshot_every: usize,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let base = match &cli.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::load_default()?,
    };
    let config = apply_overrides(&cli, base)?;
    config.validate()?;

    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let cancelled = Arc::new(AtomicBool::new(false));
    install_signal_handlers(&cancelled)?;

    let detector = ThresholdBlobDetector::new(config.detector)?;
    let camera = build_camera(&cli, &config)?;

    let mut presenter = MultiPresenter::new().with(Box::new(LogPresenter::new()));
    if let Some(dir) = &cli.snapshot_dir {
        log::info!(
            "Writing snapshots of every {} frames to {}",
            cli.snapshot_every,
            dir.display()
        );
        let mut snapshots = SnapshotPresenter::new(dir, cli.snapshot_every);
        if let Some(font) = &cli.font {
            snapshots = snapshots.with_font_file(font)?;
        }
        presenter.push(Box::new(snapshots));
    }

    let mut monitor = TrayMonitor::new(
        camera,
        Box::new(detector),
        Box::new(presenter),
        &config,
        Some(cancelled),
    )
    .with_logger(Box::new(StdoutMonitorLogger::default()))
    .with_max_frames(cli.max_frames);

    let summary = monitor.run()?;
    log::info!(
        "Processed {} frames, raised {} alerts ({})",
        summary.frames_processed,
        summary.alerts_raised,
        summary.reason
    );
    Ok(())
}

/// Layers command-line flags over the file/default configuration.
fn apply_overrides(
    cli: &Cli,
    mut config: MonitorConfig,
) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.replay {
        config.device = dir.to_string_lossy().into_owned();
    } else if let Some(device) = &cli.device {
        config.device = device.clone();
    }
    if let Some(format) = &cli.input_format {
        config.input_format = Some(format.clone());
    }
    if !cli.regions.is_empty() {
        config.regions = cli
            .regions
            .iter()
            .map(|r| parse_region(r))
            .collect::<Result<_, _>>()?;
    }
    if let Some(threshold) = cli.low_threshold {
        config.low_threshold = threshold;
    }
    if let Some(kernel) = cli.blur_kernel {
        config.detector.blur_kernel = kernel;
    }
    if let Some(cutoff) = cli.cutoff {
        config.detector.cutoff = cutoff;
    }
    if let Some(min_area) = cli.min_area {
        config.detector.min_area = min_area;
    }
    if let Some(polarity) = cli.polarity {
        config.detector.polarity = polarity;
    }
    if let Some(timeout) = cli.frame_timeout_ms {
        config.frame_timeout_ms = Some(timeout);
    }
    Ok(config)
}

fn build_camera(
    cli: &Cli,
    config: &MonitorConfig,
) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    let base: Box<dyn Camera> = if cli.replay.is_some() {
        Box::new(ImageDirCamera::new())
    } else {
        let mut camera = FfmpegCamera::new();
        if let Some(format) = &config.input_format {
            camera = camera.with_input_format(format.clone());
        }
        for option in &cli.capture_options {
            let (key, value) = option
                .split_once('=')
                .ok_or_else(|| format!("Capture option must be KEY=VALUE, got '{option}'"))?;
            camera = camera.with_option(key, value);
        }
        Box::new(camera)
    };

    Ok(match config.frame_timeout() {
        Some(timeout) => Box::new(TimeoutCamera::new(base, timeout)),
        None => base,
    })
}

/// First SIGINT/SIGTERM requests a clean stop; a second one exits at once
/// even if a frame read is blocked.
fn install_signal_handlers(cancelled: &Arc<AtomicBool>) -> Result<(), Box<dyn std::error::Error>> {
    use signal_hook::consts::{SIGINT, SIGTERM};

    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(signal, 1, Arc::clone(cancelled))?;
        signal_hook::flag::register(signal, Arc::clone(cancelled))?;
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.replay {
        if !dir.is_dir() {
            return Err(format!("Replay directory not found: {}", dir.display()).into());
        }
        if cli.device.is_some() {
            return Err("--replay and --device are mutually exclusive".into());
        }
    }
    if cli.font.is_some() && cli.snapshot_dir.is_none() {
        return Err("--font only applies together with --snapshot-dir".into());
    }
    if cli.snapshot_every == 0 {
        return Err("Snapshot interval must be at least 1".into());
    }
    if cli.max_frames == Some(0) {
        return Err("Max frames must be at least 1".into());
    }
    Ok(())
}
