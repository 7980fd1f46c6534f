mod camera;
mod overlay;
mod recorder;
mod window;

use anyhow::Context;
use camera::open_first_working;
use overlay::StatusOverlay;
use recorder::VideoRecorder;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use watchpost::config::Config;
use watchpost::error::SessionError;
use watchpost::pipeline::WatchPipeline;
use watchpost::session::{Headless, Session, SessionEnd};
use window::PreviewWindow;

const CONFIG_ENV: &str = "WATCHPOST_CONFIG";
const DEFAULT_CONFIG: &str = "watchpost.toml";

fn main() -> anyhow::Result<()> {
    // --- 1. Configuration ---
    // The only positional argument is the output video path.
    let output_path = std::env::args().nth(1).map(PathBuf::from);
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG));

    let mut config = match Config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };
    if let Some(path) = output_path {
        config.recording.output_path = path;
    }

    // RUST_LOG wins over the configured level.
    let default_level = config.logging.level_filter().context("logging level")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    info!(
        output = %config.recording.output_path.display(),
        threshold = config.detector.threshold,
        min_region_area = config.detector.min_region_area,
        update_rate = config.detector.background_update_rate,
        "watchpost starting"
    );

    // --- 2. Camera ---
    let mut camera = match open_first_working(&config.camera) {
        Ok(camera) => camera,
        Err(e @ SessionError::DeviceUnavailable { .. }) => {
            error!(error = %e, "no working camera found");
            print_camera_hints();
            return Ok(());
        }
        Err(e) => return Err(e).context("opening camera"),
    };
    info!(index = camera.index(), "using camera; press 'q' or ESC to quit");
    camera.settle(&config.camera);

    // --- 3. Session ---
    let mut session = Session::new(WatchPipeline::new(config.detector.clone()));
    let mut overlay = StatusOverlay::new();
    let mut recorder = VideoRecorder::new(&config.recording);

    let outcome = if config.display.enabled {
        let mut window = PreviewWindow::open(&config.display.window_title)
            .context("opening preview window")?;
        session.run(&mut camera, &mut overlay, &mut recorder, &mut window)
    } else {
        session.run(&mut camera, &mut overlay, &mut recorder, &mut Headless)
    };

    // --- 4. Cleanup ---
    let frames_written = recorder.frame_count();
    drop(recorder);
    drop(camera);

    let summary = outcome.context("surveillance session failed")?;
    match &summary.end {
        SessionEnd::QuitRequested => info!("exiting on user request"),
        SessionEnd::SourceFailed(reason) => error!(%reason, "camera stopped delivering frames"),
    }
    info!(
        frames = summary.frames,
        alarms = summary.alarms,
        frames_written,
        output = %config.recording.output_path.display(),
        "resources released"
    );
    Ok(())
}

fn print_camera_hints() {
    eprintln!("No working camera found. Things to try:");
    eprintln!("  1. Close other applications that may be holding the camera.");
    eprintln!("  2. Disable or disconnect phone/virtual cameras that take over device index 0.");
    eprintln!("  3. Set [camera] probe_indices or backend in {DEFAULT_CONFIG} and run again.");
}
