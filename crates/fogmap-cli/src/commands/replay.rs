//! Replay command implementation
//!
//! Feeds a recorded track through the same tracker used for live tracking,
//! using each fix's own timestamp as the clock.

use crate::cli::ReplayArgs;
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::ReplayOutput;
use crate::storage::open_store;
use crate::track::{detect_format, load_fixes};
use anyhow::{bail, Result};
use fogmap_core::config::CliConfigOverrides;
use fogmap_tracking::{ManualFixSource, StartOutcome, TimeSource, Tracker};
use std::path::Path;
use std::sync::Arc;

pub async fn execute(args: ReplayArgs, data_dir: &Path, output: &OutputWriter) -> Result<()> {
    let format = match args.format {
        Some(format) => format,
        None => detect_format(&args.file)?,
    };
    let fixes = load_fixes(&args.file, format)?;
    if fixes.is_empty() {
        bail!("No fixes found in {}", args.file.display());
    }
    if args.batch == Some(0) {
        bail!("--batch must be at least 1");
    }
    tracing::debug!(format = ?format, fixes = fixes.len(), "Loaded track");

    let overrides = CliConfigOverrides { precision: args.precision, ..Default::default() };
    let config = load_config_with_overrides(data_dir, overrides)?;
    let store = open_store(data_dir, &config).await;
    let cells_before = store.len();

    // The first fix doubles as the one-shot fix taken at start
    let total = fixes.len();
    let mut remaining = fixes.into_iter();
    let source = ManualFixSource::new();
    source.set_current_fix(remaining.next());

    let mut tracker = Tracker::new(Arc::new(source.clone()), store.clone(), config.precision())
        .with_time_source(TimeSource::FixTimestamp);

    match tracker.start().await {
        StartOutcome::Started => {}
        StartOutcome::PermissionDenied => bail!("Location permission denied"),
        StartOutcome::Failed(reason) => bail!("Failed to start tracking: {}", reason),
    }

    let remaining: Vec<_> = remaining.collect();
    match args.batch {
        Some(size) => {
            for chunk in remaining.chunks(size) {
                source.push_batch(chunk.to_vec());
                tracker.pump().await;
            }
        }
        None => {
            for fix in remaining {
                source.push(fix);
                tracker.pump().await;
            }
        }
    }
    tracker.stop().await;

    let stats = &tracker.location().stats;
    let accepted = stats.update_count;
    let result = ReplayOutput {
        file: args.file.display().to_string(),
        fixes: total,
        accepted,
        skipped: (total as u64).saturating_sub(accepted),
        new_cells: store.len().saturating_sub(cells_before),
        total_cells: store.len(),
        distance_m: stats.distance_traveled_m,
        final_mode: tracker.mode().to_string(),
        resubscriptions: source.subscribed_profiles().len().saturating_sub(1),
        last_error: tracker.status().last_error.clone(),
    };

    if store.write_failures() > 0 {
        output.warning(format!(
            "{} writes to {} failed; explored areas may not be saved",
            store.write_failures(),
            data_dir.display()
        ));
    }

    if output.is_json() {
        output.result(result)?;
    } else {
        output.success(format!("Replayed {} fixes from {}", result.fixes, result.file));
        output.kv("Accepted", result.accepted);
        output.kv("Skipped", result.skipped);
        output.kv("New cells", result.new_cells);
        output.kv("Total cells", result.total_cells);
        output.kv("Distance", format!("{:.1} m", result.distance_m));
        output.kv("Final mode", &result.final_mode);
        output.kv("Resubscriptions", result.resubscriptions);
    }

    Ok(())
}
