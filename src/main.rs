// Headless runner: opens the camera, keeps the tracker fed and logs the smoothed
// position whenever it changes. Serving the position to clients is left to the host.
//
// Environment:
//   LASER_VISION_CONFIG     optional path to a JSON `TrackerConfig`
//   LASER_VISION_CAMERA     camera index, overrides the config file
//   LASER_VISION_REPORT_MS  detection period in milliseconds (default 100)
//   LASER_VISION_SNAPSHOT   optional file the last frame is written to on exit
//                           (PNG for a `.png` path, JPEG otherwise)
//   RUST_LOG                tracing filter (default "info")

use anyhow::Context;
use laser_vision::core_modules::utils::image_helper::image_helper;
use laser_vision::{JsonFileStore, LaserTracker, TrackerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_REPORT_MS: u64 = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let report_every = Duration::from_millis(env_parse("LASER_VISION_REPORT_MS")?.unwrap_or(DEFAULT_REPORT_MS));
    info!(
        "Laser Vision starting: camera {}, {}x{}, calibration at {}",
        config.capture.camera_index,
        config.capture.width,
        config.capture.height,
        config.calibration_path.display()
    );

    let store = JsonFileStore::new(config.calibration_path.clone());
    let tracker = Arc::new(LaserTracker::new(config, Box::new(store))?);
    info!("active calibration: {:?}", tracker.calibration());

    let acquisition = start_camera(&tracker)?;

    let mut ticker = tokio::time::interval(report_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = None;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if acquisition.is_finished() {
                    warn!("acquisition stopped on its own");
                    break;
                }
                let worker = Arc::clone(&tracker);
                let position = tokio::task::spawn_blocking(move || worker.locate())
                    .await
                    .context("detection task")?;
                if last != Some(position) {
                    info!("position {}", serde_json::to_string(&position)?);
                    last = Some(position);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                info!("shutting down");
                break;
            }
        }
    }

    let stats = acquisition.shutdown().await?;
    info!(
        "camera released after {} frames ({} failed reads)",
        stats.frames_published, stats.failed_reads
    );

    if let Some(path) = std::env::var_os("LASER_VISION_SNAPSHOT").map(PathBuf::from) {
        save_snapshot(&tracker, &path).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn save_snapshot(tracker: &LaserTracker, path: &Path) -> anyhow::Result<()> {
    let Some(frame) = tracker.snapshot_frame() else {
        warn!("no frame was captured, nothing written to {}", path.display());
        return Ok(());
    };
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")) {
        image_helper::save_png(path, &frame.image)?;
    } else {
        std::fs::write(path, image_helper::encode_jpeg(&frame.image, image_helper::DEFAULT_JPEG_QUALITY)?)?;
    }
    info!("frame {} written to {}", frame.frame_id, path.display());
    Ok(())
}

fn load_config() -> anyhow::Result<TrackerConfig> {
    let mut config = match std::env::var_os("LASER_VISION_CONFIG") {
        Some(path) => TrackerConfig::load(&path)?,
        None => TrackerConfig::default(),
    };
    if let Some(index) = env_parse("LASER_VISION_CAMERA")? {
        config.capture.camera_index = index;
    }
    Ok(config)
}

fn env_parse<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name}={value:?} is not valid")),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {name}")),
    }
}

#[cfg(feature = "camera")]
fn start_camera(tracker: &LaserTracker) -> anyhow::Result<laser_vision::AcquisitionHandle> {
    use laser_vision::core_modules::camera::OpenCvCamera;

    let capture = &tracker.config().capture;
    let camera = OpenCvCamera::open(capture.camera_index, capture.width, capture.height)
        .with_context(|| format!("opening camera {}", capture.camera_index))?;
    Ok(tracker.start_acquisition(camera))
}

#[cfg(not(feature = "camera"))]
fn start_camera(_tracker: &LaserTracker) -> anyhow::Result<laser_vision::AcquisitionHandle> {
    anyhow::bail!("laser_vision was built without camera support; rebuild with `--features camera`")
}
