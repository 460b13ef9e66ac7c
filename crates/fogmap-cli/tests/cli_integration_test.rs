//! Integration tests for the fogmap binary
//!
//! Each test works in its own temporary data directory and checks the JSON
//! output of the commands.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn fogmap(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fogmap"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("FOGMAP_PRECISION")
        .env_remove("FOGMAP_STORAGE_KEY")
        .output()
        .expect("Failed to execute command")
}

fn json_of(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Output should be valid JSON")
}

/// A walk north at ~1.4 m/s, one fix every 10 s
fn write_walk(dir: &Path) -> std::path::PathBuf {
    let fixes: Vec<serde_json::Value> = (0..30)
        .map(|i| {
            serde_json::json!({
                "latitude": 49.2800 + i as f64 * 0.000126,
                "longitude": -123.1207,
                "speed": 1.4,
                "timestamp": 1_714_550_400_000i64 + i * 10_000,
            })
        })
        .collect();
    let path = dir.join("walk.json");
    std::fs::write(&path, serde_json::to_string(&fixes).unwrap()).unwrap();
    path
}

#[test]
fn test_replay_records_explored_cells() {
    let dir = TempDir::new().unwrap();
    let track = write_walk(dir.path());
    let data_dir = dir.path().join("data");

    let output = fogmap(&data_dir, &["replay", track.to_str().unwrap(), "--json"]);
    let parsed = json_of(&output);

    assert_eq!(parsed["status"], "success");
    let data = &parsed["data"];
    assert_eq!(data["fixes"], 30);
    assert_eq!(data["accepted"], 30);
    assert_eq!(data["final_mode"], "high");
    assert!(data["new_cells"].as_u64().unwrap() >= 2);
    assert!(data_dir.join("explored_areas.json").exists());

    // Replaying the same track explores nothing new
    let again = json_of(&fogmap(&data_dir, &["replay", track.to_str().unwrap(), "--json"]));
    assert_eq!(again["data"]["new_cells"], 0);
    assert_eq!(again["data"]["total_cells"], data["total_cells"]);
}

#[test]
fn test_status_reports_counts_and_config() {
    let dir = TempDir::new().unwrap();
    let track = write_walk(dir.path());
    fogmap(dir.path(), &["replay", track.to_str().unwrap(), "--json"]);

    let parsed = json_of(&fogmap(dir.path(), &["status", "--json"]));
    let data = &parsed["data"];

    assert!(data["total_cells"].as_u64().unwrap() >= 2);
    assert_eq!(data["by_precision"]["7"], data["total_cells"]);
    assert_eq!(data["config"]["precision"]["value"], "7");
    assert_eq!(data["config"]["precision"]["source"], "Default");
}

#[test]
fn test_fog_writes_geojson_with_holes() {
    let dir = TempDir::new().unwrap();
    let track = write_walk(dir.path());
    fogmap(dir.path(), &["replay", track.to_str().unwrap(), "--json"]);

    let out = dir.path().join("fog.geojson");
    let parsed = json_of(&fogmap(
        dir.path(),
        &[
            "fog", "--lat", "49.2818", "--lon", "-123.1207", "--out",
            out.to_str().unwrap(), "--json",
        ],
    ));
    assert!(parsed["data"]["holes"].as_u64().unwrap() >= 2);

    let geojson: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(geojson["type"], "FeatureCollection");
    let feature = &geojson["features"][0];
    assert_eq!(feature["geometry"]["type"], "Polygon");
    assert_eq!(feature["properties"]["fill"], "#000000");
}

#[test]
fn test_fog_without_exploration_is_opaque() {
    let dir = TempDir::new().unwrap();

    let output = fogmap(dir.path(), &["fog", "--lat", "49.2827", "--lon", "-123.1207"]);
    let geojson = json_of(&output);

    let rings = geojson["features"][0]["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(rings.len(), 1, "only the outer ring");
    assert_eq!(geojson["features"][0]["properties"]["holes"], 0);
}

#[test]
fn test_reset_replaces_exploration() {
    let dir = TempDir::new().unwrap();
    let track = write_walk(dir.path());
    fogmap(dir.path(), &["replay", track.to_str().unwrap(), "--json"]);

    let parsed = json_of(&fogmap(
        dir.path(),
        &["reset", "--lat", "40.7128", "--lon", "-74.0060", "--precision", "6", "--json"],
    ));
    assert_eq!(parsed["data"]["precision"], 6);
    assert_eq!(parsed["data"]["geohash"].as_str().unwrap().len(), 6);

    let status = json_of(&fogmap(dir.path(), &["status", "--json"]));
    assert_eq!(status["data"]["total_cells"], 1);
}

#[test]
fn test_invalid_precision_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = fogmap(dir.path(), &["reset", "--lat", "0", "--lon", "0", "--precision", "13"]);
    assert!(!output.status.success());
}
