//! Detect command - configure a detection filter and print what it finds.
//!
//! World objects come from a JSON scenario file. Filters declared in the
//! scenario are applied first; `--radius-*` and `--pattern` then refine the
//! filter for the selected camera and image type.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use simdetect::config::ConfigFile;
use simdetect::{
    CameraName, DetectionInfo, DetectionSearch, DetectionSession, FilterKey, ImageType, Scenario,
};
use tracing::{info, warn};

use super::common::{resolve_camera, resolve_cli_radius, resolve_image_type};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Granularity of the Ctrl-C check while waiting between frames.
const WATCH_POLL: Duration = Duration::from_millis(100);

/// Arguments for the detect command.
pub struct DetectArgs {
    pub world: PathBuf,
    pub camera: Option<String>,
    pub image_type: Option<ImageType>,
    pub radius_m: Option<f64>,
    pub radius_cm: Option<f64>,
    pub patterns: Vec<String>,
    pub json: bool,
    pub watch: Option<f64>,
}

/// Run the detect command.
pub fn run(args: DetectArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("detect");
    let config = runner.config();

    let camera = resolve_camera(args.camera.clone(), config)?;
    let image_type = resolve_image_type(args.image_type, config);

    let scenario = Scenario::load(&args.world)?;
    let searches = scenario.filters().to_vec();
    let world = Arc::new(scenario.into_world());
    let session = DetectionSession::with_options(world.clone(), config.detection.match_options());

    configure_filter(&session, &searches, &camera, image_type, &args, config)?;

    let key = FilterKey::new(camera.clone(), image_type);
    match args.watch {
        None => {
            let detections = session.detections(&camera, image_type);
            print_detections(&key, &detections, args.json)
        }
        Some(seconds) => {
            let interval = watch_interval(seconds)?;
            let running = Arc::new(AtomicBool::new(true));
            let flag = Arc::clone(&running);
            ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
                .map_err(|e| CliError::Signal(e.to_string()))?;

            info!(key = %key, interval_secs = seconds, "Watching detections (Ctrl-C to stop)");
            let mut frame: u64 = 0;
            while running.load(Ordering::SeqCst) {
                frame += 1;
                if frame > 1 {
                    match Scenario::load(&args.world) {
                        Ok(scenario) => world.replace(scenario.objects()),
                        Err(e) => warn!(error = %e, "Failed to reload scenario, keeping previous frame"),
                    }
                }

                let detections = session.detections(&camera, image_type);
                if !args.json {
                    println!("--- frame {} ---", frame);
                }
                print_detections(&key, &detections, args.json)?;
                wait_for_next_frame(interval, &running);
            }
            info!(frames = frame, "Stopped watching");
            Ok(())
        }
    }
}

/// Apply scenario searches, then CLI radius and patterns.
fn configure_filter(
    session: &DetectionSession,
    searches: &[DetectionSearch],
    camera: &CameraName,
    image_type: ImageType,
    args: &DetectArgs,
    config: &ConfigFile,
) -> Result<(), CliError> {
    for search in searches {
        session.start_detection_search(search)?;
    }

    let registry = session.registry();
    let configured_radius = registry
        .filter(camera, image_type)
        .and_then(|snapshot| snapshot.radius);

    // CLI radius wins; config default only fills an unset radius.
    match resolve_cli_radius(args.radius_m, args.radius_cm) {
        Some(radius) => registry.set_radius(camera, image_type, radius)?,
        None => {
            if let (None, Some(radius)) = (configured_radius, config.detection.default_radius()) {
                registry.set_radius(camera, image_type, radius)?;
            }
        }
    }

    for pattern in &args.patterns {
        registry.add_name_pattern(camera, image_type, pattern)?;
    }

    let has_patterns = registry
        .filter(camera, image_type)
        .map(|snapshot| !snapshot.patterns.is_empty())
        .unwrap_or(false);
    if !has_patterns {
        return Err(CliError::Config(format!(
            "no name patterns for {}. Use --pattern or add a filter to the scenario.",
            FilterKey::new(camera.clone(), image_type)
        )));
    }

    if let Some(snapshot) = registry.filter(camera, image_type) {
        info!(camera = %camera, image_type = %image_type, filter = %snapshot, "Filter configured");
    }
    Ok(())
}

fn watch_interval(seconds: f64) -> Result<Duration, CliError> {
    let invalid = |reason: String| {
        CliError::Config(format!(
            "--watch interval must be a positive number of seconds, got {} ({})",
            seconds, reason
        ))
    };
    if seconds <= 0.0 {
        return Err(invalid("not positive".to_string()));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| invalid(e.to_string()))
}

fn wait_for_next_frame(interval: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(WATCH_POLL.min(deadline - now));
    }
}

fn print_detections(
    key: &FilterKey,
    detections: &[DetectionInfo],
    json: bool,
) -> Result<(), CliError> {
    if json {
        let text = serde_json::to_string_pretty(detections)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    if detections.is_empty() {
        println!("No detections for {}", key);
        return Ok(());
    }

    println!("{} detection(s) for {}", detections.len(), key);
    for detection in detections {
        println!("{}", format_detection(detection));
    }
    Ok(())
}

/// Human-readable block for one detection.
fn format_detection(detection: &DetectionInfo) -> String {
    let p = &detection.relative_pose.position;
    let q = &detection.relative_pose.orientation;
    let b2 = &detection.box2d;
    let b3 = &detection.box3d;
    format!(
        "Detection: {}\n  \
         position:    ({:.2}, {:.2}, {:.2}) m\n  \
         orientation: (w={:.3}, x={:.3}, y={:.3}, z={:.3})\n  \
         box2D:       ({:.0}, {:.0}) - ({:.0}, {:.0})\n  \
         box3D:       ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})\n  \
         geo point:   {}",
        detection.name,
        p.x,
        p.y,
        p.z,
        q.w,
        q.x,
        q.y,
        q.z,
        b2.min.x,
        b2.min.y,
        b2.max.x,
        b2.max.y,
        b3.min.x,
        b3.min.y,
        b3.min.z,
        b3.max.x,
        b3.max.y,
        b3.max.z,
        detection.geo_point,
    )
}
