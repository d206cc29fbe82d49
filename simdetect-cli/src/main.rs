//! simdetect CLI - Command-line interface
//!
//! Configures detection filters against a scenario's world objects and prints
//! the resulting detections.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simdetect::ImageType;

use commands::common::parse_image_type;
use commands::config::ConfigCommands;
use commands::detect::DetectArgs;

#[derive(Debug, Parser)]
#[command(name = "simdetect", version, about = "Simulator object detection filters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Configure a detection filter and print matching objects
    Detect {
        /// Scenario JSON file with world objects (and optional filters)
        #[arg(long, short = 'w')]
        world: PathBuf,

        /// Camera name or numeric id [default: from config, else 0]
        #[arg(long, short = 'c')]
        camera: Option<String>,

        /// Image type: scene, depth_planar, segmentation, ... or 0-9
        #[arg(long, short = 't', value_parser = parse_image_type)]
        image_type: Option<ImageType>,

        /// Detection radius in metres
        #[arg(long, conflicts_with = "radius_cm")]
        radius_m: Option<f64>,

        /// Detection radius in centimetres
        #[arg(long)]
        radius_cm: Option<f64>,

        /// Object name pattern (glob, or `regex:` prefix); repeatable
        #[arg(long = "pattern", short = 'p')]
        patterns: Vec<String>,

        /// Print detections as JSON
        #[arg(long)]
        json: bool,

        /// Re-read the scenario and query again every N seconds until Ctrl-C
        #[arg(long, value_name = "SECONDS")]
        watch: Option<f64>,
    },

    /// Show the filters a scenario file configures
    Filters {
        /// Scenario JSON file
        #[arg(long, short = 'w')]
        world: PathBuf,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect {
            world,
            camera,
            image_type,
            radius_m,
            radius_cm,
            patterns,
            json,
            watch,
        } => commands::detect::run(DetectArgs {
            world,
            camera,
            image_type,
            radius_m,
            radius_cm,
            patterns,
            json,
            watch,
        }),
        Commands::Filters { world } => commands::filters::run(&world),
        Commands::Config { command } => commands::config::run(command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
