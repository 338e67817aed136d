// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan Replay - feed a recorded AR session through the scan pipeline.
//!
//! Usage:
//!   roomscan-replay <recording.jsonl> [--format glb|usda|obj] [--output <dir>]
//!
//! Settings come from `ROOMSCAN_*` environment variables (see
//! [`config::Config::from_env`]); command-line options win. The finished
//! `ScanResult` is printed as JSON on stdout.

use anyhow::{bail, Result};
use roomscan_core::ExportFormat;
use std::path::PathBuf;

mod config;
mod recording;
mod replay;

use config::Config;

struct Args {
    recording: PathBuf,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage: roomscan-replay <recording.jsonl> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --format <glb|usda|obj>  Export format (default: $ROOMSCAN_FORMAT or glb)");
    eprintln!("  --output <dir>           Export directory (default: $ROOMSCAN_EXPORT_DIR)");
    eprintln!("  -h, --help               Show this help");
}

fn parse_args(args: &[String]) -> Result<Option<Args>> {
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        return Ok(None);
    }

    let mut parsed = Args {
        recording: PathBuf::from(&args[0]),
        format: None,
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--format" => {
                i += 1;
                let Some(name) = args.get(i) else {
                    bail!("--format needs a value");
                };
                match ExportFormat::try_from_name(name) {
                    Some(format) => parsed.format = Some(format),
                    None => {
                        tracing::warn!(format = %name, "Unknown export format, using glb");
                        parsed.format = Some(ExportFormat::default());
                    }
                }
            }
            "--output" => {
                i += 1;
                let Some(dir) = args.get(i) else {
                    bail!("--output needs a value");
                };
                parsed.output = Some(PathBuf::from(dir));
            }
            other => bail!("Unknown option: {}", other),
        }
        i += 1;
    }
    Ok(Some(parsed))
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,roomscan_processing=debug".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before Config::from_env so its warnings are visible
    init_tracing(config::env_flag("ROOMSCAN_LOG_JSON"));

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            print_usage();
            return Err(err);
        }
    };

    let mut config = Config::from_env();
    if let Some(dir) = args.output {
        config.scan.export_dir = dir;
    }
    let format = args.format.unwrap_or(config.scan.default_format);

    tracing::info!(
        recording = %args.recording.display(),
        %format,
        export_dir = %config.scan.export_dir.display(),
        scene_reconstruction = config.capabilities.scene_reconstruction,
        depth = config.capabilities.depth,
        "Starting RoomScan replay"
    );

    let result = replay::run(&args.recording, &config, format).await?;
    if !config.events_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
