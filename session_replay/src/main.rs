use std::{fs::OpenOptions, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use session_tracker_lib::MapStyle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod gpx_util;
mod replay;

use config::ReplayConfig;

/// Replays a recorded GPX track through the session tracker.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// GPX file to replay
    track: PathBuf,

    /// `key = value` config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from the fallback anchor instead of the first track point
    #[arg(long)]
    no_initial_fix: bool,

    /// Pace the samples by their timestamps and tick the clock in real time
    #[arg(long)]
    realtime: bool,

    /// Playback speed factor for --realtime
    #[arg(long, default_value_t = 1.0)]
    speedup: f64,

    #[arg(long)]
    map_style: Option<String>,

    #[arg(long)]
    camera_altitude: Option<f64>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = match &args.log_file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?,
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,session_tracker_lib=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(log_file.map(|file| tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file)))
        .init();

    let mut config = match &args.config {
        Some(path) => ReplayConfig::load(path)?,
        None => ReplayConfig::default(),
    };
    if let Some(style) = &args.map_style {
        config.view.map_style = MapStyle::parse(style).with_context(|| format!("Unknown map style {style}"))?;
    }
    if let Some(altitude) = args.camera_altitude {
        config.view.camera_altitude_m = altitude;
    }

    let samples = gpx_util::read_gpx_file(&args.track)?;
    tracing::info!("Loaded {} samples from {:?}", samples.len(), args.track);

    let anchor = match samples.first() {
        Some(first) if !args.no_initial_fix => first.coordinate,
        _ => config.fallback,
    };

    let summary = if args.realtime {
        replay::replay_realtime(&samples, anchor, config.view, args.speedup).await?
    } else {
        replay::replay_stepped(&samples, anchor, config.view)?
    };

    summary.log();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
