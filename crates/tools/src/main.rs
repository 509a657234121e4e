use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cluster::Clusterer;
use foundation::math::Coordinate;
use foundation::points::GeoPoint;
use layers::{CategoryFilter, MarkerLayer};
use map::MapConfig;
use serde::Serialize;
use tools::{ReplayOptions, TraceStep, replay};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Clustering and camera replay for forage maps")]
struct Args {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster a point snapshot for one viewport and print the markers
    Cluster {
        /// JSON array of points
        points: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long)]
        zoom: f64,

        /// Only show these categories (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Replay an event trace against a map session and print what it rendered
    Replay {
        /// JSON array of points
        points: PathBuf,

        /// JSON array of trace steps
        trace: PathBuf,

        /// Simulation step in milliseconds
        #[arg(long, default_value_t = 50)]
        frame_ms: u64,

        /// Time allowed after the last step for animations to finish
        #[arg(long, default_value_t = 3000)]
        settle_ms: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    match args.command {
        Command::Cluster {
            points,
            lat,
            lon,
            zoom,
            categories,
        } => cmd_cluster(&points, Coordinate::new(lat, lon), zoom, &categories, args.pretty),
        Command::Replay {
            points,
            trace,
            frame_ms,
            settle_ms,
        } => cmd_replay(&points, &trace, ReplayOptions { frame_ms, settle_ms }, args.pretty),
    }
}

fn cmd_cluster(
    path: &Path,
    center: Coordinate,
    zoom: f64,
    categories: &[String],
    pretty: bool,
) -> Result<(), String> {
    let points: Vec<GeoPoint> = read_json(path)?;
    let filter = if categories.is_empty() {
        CategoryFilter::all()
    } else {
        let mut f = CategoryFilter::none();
        for tag in categories {
            f.set(foundation::points::Category::from_tag(tag), true);
        }
        f
    };
    let visible = filter.apply(&points);

    let config = MapConfig::from_env();
    let mut clusterer = Clusterer::new(config.cluster_options());
    let nodes = clusterer.cluster(&visible, center, zoom);
    let layer = MarkerLayer::from_nodes(&nodes, &visible);
    tracing::info!(
        points = visible.len(),
        markers = layer.len(),
        zoom,
        "clustered snapshot"
    );
    print_json(&layer, pretty)
}

fn cmd_replay(
    points: &Path,
    trace: &Path,
    options: ReplayOptions,
    pretty: bool,
) -> Result<(), String> {
    let points: Vec<GeoPoint> = read_json(points)?;
    let steps: Vec<TraceStep> = read_json(trace)?;
    let report = replay(MapConfig::from_env(), &points, &steps, options).map_err(|e| e.to_string())?;
    tracing::info!(
        renders = report.renders.len(),
        events = report.events.len(),
        "replay finished"
    );
    print_json(&report, pretty)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let bytes = fs::read(path).map_err(|e| format!("read {path:?}: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("parse {path:?}: {e}"))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| format!("serialize output: {e}"))?;
    println!("{out}");
    Ok(())
}
