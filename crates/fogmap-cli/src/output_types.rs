use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

/// Output for replay command
#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    pub file: String,
    pub fixes: usize,
    pub accepted: u64,
    pub skipped: u64,
    pub new_cells: usize,
    pub total_cells: usize,
    pub distance_m: f64,
    pub final_mode: String,
    pub resubscriptions: usize,
    pub last_error: Option<String>,
}

/// Output for fog command when writing to a file
#[derive(Debug, Serialize)]
pub struct FogOutput {
    pub path: String,
    pub holes: usize,
    pub outer_vertices: usize,
}

/// Output for reset command
#[derive(Debug, Serialize)]
pub struct ResetOutput {
    pub geohash: String,
    pub precision: u8,
    pub timestamp: DateTime<Utc>,
}

/// Output for status command
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub data_dir: String,
    pub storage_key: String,
    pub total_cells: usize,
    pub by_precision: BTreeMap<u8, usize>,
    pub config: BTreeMap<String, ConfigEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<CellRow>>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}

/// Table row for configuration display
#[derive(Debug, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Table row for explored cells per precision
#[derive(Debug, Tabled)]
pub struct PrecisionRow {
    #[tabled(rename = "Precision")]
    pub precision: u8,
    #[tabled(rename = "Cells")]
    pub cells: usize,
}

/// Table row for a single explored cell
#[derive(Debug, Serialize, Tabled)]
pub struct CellRow {
    #[tabled(rename = "Geohash")]
    pub geohash: String,
    #[tabled(rename = "Precision")]
    pub precision: u8,
    #[tabled(rename = "Explored At")]
    pub explored_at: String,
}
