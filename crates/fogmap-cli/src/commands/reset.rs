//! Reset command implementation

use crate::cli::ResetArgs;
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::ResetOutput;
use crate::storage::open_store;
use anyhow::{bail, Result};
use fogmap_core::config::CliConfigOverrides;
use std::path::Path;

pub async fn execute(args: ResetArgs, data_dir: &Path, output: &OutputWriter) -> Result<()> {
    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
        bail!("Coordinates out of range: ({}, {})", args.lat, args.lon);
    }

    let overrides = CliConfigOverrides { precision: args.precision, ..Default::default() };
    let config = load_config_with_overrides(data_dir, overrides)?;
    let store = open_store(data_dir, &config).await;
    let previous = store.len();

    let area = store.reset(args.lat, args.lon, config.precision()).await;
    if store.write_failures() > 0 {
        bail!("Failed to persist reset to {}", data_dir.display());
    }

    if output.is_json() {
        output.result(ResetOutput {
            geohash: area.geohash.clone(),
            precision: area.precision.get(),
            timestamp: area.timestamp,
        })?;
    } else {
        output.success(format!(
            "Reset exploration to cell {} (precision {})",
            area.geohash, area.precision
        ));
        output.info(format!("Discarded {} previously explored cells", previous));
    }

    Ok(())
}
