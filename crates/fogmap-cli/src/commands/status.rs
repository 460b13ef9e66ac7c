//! Status command implementation

use crate::cli::StatusArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{CellRow, ConfigEntry, ConfigRow, PrecisionRow, StatusOutput};
use crate::storage::open_store;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

pub async fn execute(args: StatusArgs, data_dir: &Path, output: &OutputWriter) -> Result<()> {
    let config = load_config(data_dir)?;
    let store = open_store(data_dir, &config).await;
    let stats = store.stats();

    let config_map: BTreeMap<String, ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| (key, ConfigEntry { value, source: format!("{:?}", source) }))
        .collect();

    let cells = args.verbose.then(|| {
        store
            .areas()
            .into_iter()
            .map(|area| CellRow {
                geohash: area.geohash,
                precision: area.precision.get(),
                explored_at: area.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            })
            .collect::<Vec<_>>()
    });

    if output.is_json() {
        output.result(StatusOutput {
            data_dir: data_dir.display().to_string(),
            storage_key: store.key().to_string(),
            total_cells: stats.total,
            by_precision: stats.by_precision,
            config: config_map,
            cells,
        })?;
        return Ok(());
    }

    output.section("Exploration");
    output.kv("Data directory", data_dir.display());
    output.kv("Storage key", store.key());
    output.kv("Explored cells", stats.total);
    if stats.total == 0 {
        output.info("Nothing explored yet. Run 'fogmap replay <track>' to record a track");
    } else {
        output.table(
            stats
                .by_precision
                .iter()
                .map(|(precision, cells)| PrecisionRow { precision: *precision, cells: *cells })
                .collect(),
        );
    }

    if let Some(cells) = cells {
        output.section("Cells");
        output.table(cells);
    }

    output.section("Configuration");
    output.table(
        config_map
            .into_iter()
            .map(|(key, entry)| ConfigRow { key, value: entry.value, source: entry.source })
            .collect(),
    );

    Ok(())
}
