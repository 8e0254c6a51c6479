//! sessionmap CLI - Debug tool for clustering and ranking
//!
//! Usage:
//!   sessionmap-cli cluster <file.geojson> --zoom <z> [--config <cluster.json>]
//!   sessionmap-cli rank <file.geojson> [--lat <lat> --lng <lng>] [--limit <n>]
//!   sessionmap-cli radii
//!
//! Reads a GeoJSON FeatureCollection as served by the sessions API and
//! prints the clusters or ranked list the map widget would render.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::info;
use sessionmap::{
    ClusterConfig, GeoPoint, PointFeature, Ranker, Result, cluster_features_with_config,
    geojson::{clusters_to_value, ranking_to_value},
    read_feature_collection,
};

#[derive(Parser)]
#[command(name = "sessionmap-cli")]
#[command(about = "Debug tool for session clustering and ranking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster sessions at a zoom level
    Cluster {
        /// GeoJSON FeatureCollection file
        file: PathBuf,

        /// Map zoom level
        #[arg(short, long, default_value = "11")]
        zoom: f64,

        /// JSON file with a cluster configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Rank sessions by distance and name
    Rank {
        /// GeoJSON FeatureCollection file
        file: PathBuf,

        /// Reference latitude
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Reference longitude
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,

        /// Only print the first N entries (the N nearest with --lat/--lng)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the cluster radius for each zoom level
    Radii {
        /// JSON file with a cluster configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Cluster { file, zoom, config } => run_cluster(&file, zoom, config.as_deref()),
        Commands::Rank {
            file,
            lat,
            lng,
            limit,
        } => {
            let reference = lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng));
            run_rank(&file, reference, limit)
        }
        Commands::Radii { config } => run_radii(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_features(path: &Path) -> Result<Vec<PointFeature>> {
    let file = File::open(path)?;
    let features = read_feature_collection(BufReader::new(file))?;
    info!("Loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

fn load_config(path: Option<&Path>) -> Result<ClusterConfig> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(serde_json::from_reader(BufReader::new(file))?)
        }
        None => Ok(ClusterConfig::default()),
    }
}

fn run_cluster(path: &Path, zoom: f64, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let features = load_features(path)?;
    let clusters = cluster_features_with_config(&features, zoom, &config);

    let grouped = clusters.iter().filter(|c| !c.is_single()).count();
    info!(
        "zoom {}: {} clusters ({} grouped, {} venue-keyed), radius {}m",
        zoom,
        clusters.len(),
        grouped,
        clusters.iter().filter(|c| c.is_venue_keyed()).count(),
        config.radius_for_zoom(zoom)
    );

    println!("{}", serde_json::to_string_pretty(&clusters_to_value(&clusters))?);
    Ok(())
}

fn run_rank(path: &Path, reference: Option<GeoPoint>, limit: Option<usize>) -> Result<()> {
    let features = load_features(path)?;
    let ranker = Ranker::new()?;
    let ranked = match (reference, limit) {
        (Some(reference), Some(limit)) => ranker.nearest(&features, reference, limit),
        (reference, limit) => {
            let mut ranked = ranker.rank(&features, reference);
            ranked.truncate(limit.unwrap_or(usize::MAX));
            ranked
        }
    };

    println!("{}", serde_json::to_string_pretty(&ranking_to_value(&ranked))?);
    Ok(())
}

fn run_radii(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    for zoom in 0..=20 {
        let zoom = f64::from(zoom);
        println!(
            "zoom {:>2}: {:>6} m{}",
            zoom,
            config.radius_for_zoom(zoom),
            if config.uses_venue_keys(zoom) { " (venue keys)" } else { "" }
        );
    }
    Ok(())
}
