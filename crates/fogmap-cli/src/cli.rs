use clap::{Parser, Subcommand};
use fogmap_core::config::{parse_opacity, parse_precision};
use fogmap_core::models::Precision;
use std::path::PathBuf;

/// FogMap - Fog-of-war exploration tracker
#[derive(Parser, Debug)]
#[command(name = "fogmap")]
#[command(about = "Fog-of-war exploration tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding config.toml and the persisted explored areas
    #[arg(long, global = true, default_value = ".fogmap")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded track (GPX or JSON fixes) through the tracker
    Replay(ReplayArgs),

    /// Render the fog polygon for a viewport as GeoJSON
    Fog(FogArgs),

    /// Replace all explored areas with the single cell at a point
    Reset(ResetArgs),

    /// Show explored-area counts and effective configuration
    Status(StatusArgs),
}

/// Track file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TrackFormat {
    /// GPX 1.0/1.1 (tracks, routes and waypoints)
    Gpx,
    /// JSON array of location fixes
    Json,
}

#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Path to the track file
    pub file: PathBuf,

    /// Track format (detected from the file extension by default)
    #[arg(long, value_enum)]
    pub format: Option<TrackFormat>,

    /// Geohash precision for explored cells (1-12)
    #[arg(long, value_parser = precision_arg)]
    pub precision: Option<Precision>,

    /// Deliver fixes in batches of this size instead of one at a time
    #[arg(long, value_name = "SIZE")]
    pub batch: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct FogArgs {
    /// Viewport center latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Viewport center longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Viewport height in degrees
    #[arg(long, default_value = "0.01")]
    pub lat_delta: f64,

    /// Viewport width in degrees
    #[arg(long, default_value = "0.01")]
    pub lon_delta: f64,

    /// Write the GeoJSON to this file instead of stdout
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Extra viewport-sizes to query on each side
    #[arg(long)]
    pub buffer_factor: Option<f64>,

    /// Degrees of opaque margin around the query window
    #[arg(long)]
    pub outer_margin: Option<f64>,

    /// Fog fill color (e.g. "#000000")
    #[arg(long)]
    pub fog_color: Option<String>,

    /// Fog fill opacity (0.0-1.0)
    #[arg(long, value_parser = opacity_arg)]
    pub fog_opacity: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Latitude of the new starting point
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the new starting point
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Geohash precision for the starting cell (1-12)
    #[arg(long, value_parser = precision_arg)]
    pub precision: Option<Precision>,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// List every explored cell
    #[arg(long)]
    pub verbose: bool,
}

fn precision_arg(s: &str) -> Result<Precision, String> {
    parse_precision(s).map_err(|e| e.to_string())
}

fn opacity_arg(s: &str) -> Result<f64, String> {
    parse_opacity(s).map_err(|e| e.to_string())
}
