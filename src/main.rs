use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ar_nav_rs::{
    LocationFix, LocationOutcome, LockOutcome, MapAnnotation, Marker, NavConfig, NavSession,
    RecordingSink, RouteStep, ScaleMapping,
};
use chrono::Utc;
use clap::Parser;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "ar_nav")]
#[command(about = "Replay a recorded navigation session and lay out AR route markers", long_about = None)]
struct Args {
    /// Path to a session_*.json[.gz] recording
    #[arg(long)]
    session: PathBuf,

    /// JSON config file (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Discard fixes with a horizontal accuracy radius above this (meters)
    #[arg(long)]
    accuracy_threshold: Option<f64>,

    /// Target distance between interpolated waypoints (meters)
    #[arg(long)]
    spacing: Option<f64>,

    /// Inverse-distance scale constant (scale = constant / distance)
    #[arg(long)]
    scale_constant: Option<f64>,

    /// Write final markers and map overlay as JSON here
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Recorded session: route snapshot plus fixes in arrival order
#[derive(Deserialize)]
struct SessionLog {
    route: Vec<RouteStep>,
    fixes: Vec<LocationFix>,
    /// Number of fixes delivered before the user locked the origin
    /// (default: all of them)
    #[serde(default)]
    lock_after: Option<usize>,
}

#[derive(Serialize)]
struct ReplayOutput {
    generated_at: String,
    config: NavConfig,
    origin: Option<LocationFix>,
    stats: Stats,
    markers: Vec<Marker>,
    annotations: Vec<MapAnnotation>,
}

#[derive(Serialize)]
struct Stats {
    fixes_total: usize,
    fixes_accepted: usize,
    origin_changes: usize,
    render_batches: usize,
    steps: usize,
    waypoints: usize,
}

fn load_session(path: &Path) -> Result<SessionLog> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let reader = BufReader::new(GzDecoder::new(file));
        Ok(serde_json::from_reader(reader)?)
    } else {
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

fn build_config(args: &Args) -> Result<NavConfig> {
    let mut config = match &args.config {
        Some(path) => NavConfig::from_json_file(path)?,
        None => NavConfig::default(),
    };
    if let Some(threshold) = args.accuracy_threshold {
        config.accuracy_threshold_m = threshold;
    }
    if let Some(spacing) = args.spacing {
        config.interpolation_spacing_m = spacing;
    }
    if let Some(constant) = args.scale_constant {
        let min_distance_m = match config.scale {
            ScaleMapping::InverseDistance { min_distance_m, .. } => min_distance_m,
            ScaleMapping::Exponential { .. } => ar_nav_rs::config::DEFAULT_SCALE_MIN_DISTANCE_M,
        };
        config.scale = ScaleMapping::InverseDistance {
            constant,
            min_distance_m,
        };
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = build_config(&args)?;
    let log = load_session(&args.session)?;
    let lock_after = log.lock_after.unwrap_or(log.fixes.len()).min(log.fixes.len());

    let mut session = NavSession::new(config.clone(), RecordingSink::new())?;
    session.on_route(log.route);

    let mut fixes_accepted = 0;
    let mut origin_changes = 0;
    let mut lock_result = None;

    for (i, fix) in log.fixes.into_iter().enumerate() {
        if i == lock_after {
            lock_result = Some(session.lock_origin());
        }
        if let LocationOutcome::Accepted { origin_changed, .. } = session.on_location(fix) {
            fixes_accepted += 1;
            if origin_changed {
                origin_changes += 1;
            }
        }
    }
    if lock_result.is_none() {
        lock_result = Some(session.lock_origin());
    }

    let (steps, waypoints) = match lock_result {
        Some(LockOutcome::Placed {
            steps, waypoints, ..
        }) => (steps, waypoints),
        Some(LockOutcome::Pending(reason)) => {
            log::warn!("Markers not placed: {}", reason);
            (0, 0)
        }
        _ => (0, 0),
    };

    let stats = Stats {
        fixes_total: session.fixes().len(),
        fixes_accepted,
        origin_changes,
        render_batches: session.renderer().batches().len(),
        steps,
        waypoints,
    };

    println!("[{}] Session replay complete", Utc::now().format("%H:%M:%S"));
    println!("  Fixes: {} ({} accepted)", stats.fixes_total, stats.fixes_accepted);
    println!("  Origin changes: {}", stats.origin_changes);
    if let Some(origin) = session.origin() {
        println!(
            "  Origin: {} (accuracy {:.1} m)",
            origin.point, origin.horizontal_accuracy
        );
    }
    println!("  Markers: {} steps, {} waypoints", stats.steps, stats.waypoints);
    println!("  Render batches: {}", stats.render_batches);

    if let Some(path) = &args.output {
        let output = ReplayOutput {
            generated_at: Utc::now().to_rfc3339(),
            config,
            origin: session.origin().copied(),
            stats,
            markers: session.markers().to_vec(),
            annotations: session
                .overlay()
                .map(|o| o.annotations().to_vec())
                .unwrap_or_default(),
        };
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &output)?;
        log::info!("Wrote {}", path.display());
    }

    Ok(())
}
