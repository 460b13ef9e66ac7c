//! Fog command implementation

use crate::cli::FogArgs;
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::FogOutput;
use crate::storage::open_store;
use anyhow::{bail, Context, Result};
use fogmap_core::config::CliConfigOverrides;
use fogmap_core::models::Viewport;
use fogmap_geo::{FogGenerator, FogGeometryExt};
use std::path::Path;

pub async fn execute(args: FogArgs, data_dir: &Path, output: &OutputWriter) -> Result<()> {
    if args.lat_delta <= 0.0 || args.lon_delta <= 0.0 {
        bail!("Viewport deltas must be positive");
    }
    for (name, value) in [("buffer-factor", args.buffer_factor), ("outer-margin", args.outer_margin)] {
        if matches!(value, Some(v) if v < 0.0) {
            bail!("--{} must not be negative", name);
        }
    }

    let overrides = CliConfigOverrides {
        buffer_factor: args.buffer_factor,
        outer_margin_deg: args.outer_margin,
        fog_color: args.fog_color,
        fog_opacity: args.fog_opacity,
        ..Default::default()
    };
    let config = load_config_with_overrides(data_dir, overrides)?;
    let store = open_store(data_dir, &config).await;

    let viewport = Viewport::new(args.lat, args.lon, args.lat_delta, args.lon_delta);
    let generator = FogGenerator::new(config.fog_config());
    let fog = generator.generate(&viewport, &store);
    let collection = fog.to_feature_collection();

    match args.out {
        Some(path) => {
            let json = serde_json::to_string_pretty(&collection)?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            if output.is_json() {
                output.result(FogOutput {
                    path: path.display().to_string(),
                    holes: fog.hole_count(),
                    outer_vertices: fog.outer.len(),
                })?;
            } else {
                output.success(format!(
                    "Wrote fog with {} holes to {}",
                    fog.hole_count(),
                    path.display()
                ));
            }
        }
        None => output.data(&collection)?,
    }

    Ok(())
}
