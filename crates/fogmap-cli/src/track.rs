//! Track file loading for replay
//!
//! GPX points are read in document order: track segments, then routes, then
//! waypoints. Points without a time are stamped one second after the
//! previous point so the replay clock still advances.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use fogmap_core::models::LocationFix;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::cli::TrackFormat;

/// Pick the format from the file extension
pub fn detect_format(path: &Path) -> Result<TrackFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("gpx") => Ok(TrackFormat::Gpx),
        Some("json") => Ok(TrackFormat::Json),
        _ => bail!(
            "Cannot detect track format of {}. Use --format gpx or --format json",
            path.display()
        ),
    }
}

/// Read every fix from a track file
pub fn load_fixes(path: &Path, format: TrackFormat) -> Result<Vec<LocationFix>> {
    match format {
        TrackFormat::Gpx => load_gpx(path),
        TrackFormat::Json => load_json(path),
    }
}

fn load_json(path: &Path) -> Result<Vec<LocationFix>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fixes from {}", path.display()))
}

fn load_gpx(path: &Path) -> Result<Vec<LocationFix>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let gpx = gpx::read(BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to parse GPX {}: {}", path.display(), e))?;

    let points = gpx
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .chain(gpx.routes.iter().flat_map(|route| route.points.iter()))
        .chain(gpx.waypoints.iter());

    let mut fixes = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;

    for waypoint in points {
        let stamped = waypoint
            .time
            .and_then(|time| time.format().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc));
        let timestamp = match (stamped, previous) {
            (Some(t), _) => t,
            (None, Some(prev)) => prev + Duration::seconds(1),
            (None, None) => Utc::now(),
        };
        previous = Some(timestamp);

        let point = waypoint.point();
        let mut fix = LocationFix::new(point.y(), point.x(), timestamp);
        fix.altitude = waypoint.elevation;
        fix.speed = waypoint.speed;
        fixes.push(fix);
    }

    Ok(fixes)
}
