//! Filters command - show the filters a scenario file configures.

use std::path::Path;
use std::sync::Arc;

use simdetect::{DetectionSession, Scenario};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the filters command.
pub fn run(world: &Path) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("filters");
    let config = runner.config();

    let scenario = Scenario::load(world)?;
    let searches = scenario.filters().to_vec();
    let object_count = scenario.objects().len();
    let session = DetectionSession::with_options(
        Arc::new(scenario.into_world()),
        config.detection.match_options(),
    );

    for search in &searches {
        session.start_detection_search(search)?;
    }

    println!("Scenario: {}", world.display());
    println!("  Objects: {}", object_count);
    println!();

    let registry = session.registry();
    if registry.is_empty() {
        println!("No filters configured.");
        return Ok(());
    }

    println!("Filters");
    println!("=======");
    for key in registry.keys() {
        if let Some(snapshot) = registry.filter(&key.camera, key.image_type) {
            let matched = session.detections(&key.camera, key.image_type).len();
            println!("  {:<28} {}  ({} match)", key.to_string(), snapshot, matched);
        }
    }
    Ok(())
}
