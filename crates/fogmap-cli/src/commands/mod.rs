//! Command implementations

mod fog;
mod replay;
mod reset;
mod status;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Replay(args) => replay::execute(args, &cli.data_dir, &output).await,
        Commands::Fog(args) => fog::execute(args, &cli.data_dir, &output).await,
        Commands::Reset(args) => reset::execute(args, &cli.data_dir, &output).await,
        Commands::Status(args) => status::execute(args, &cli.data_dir, &output).await,
    }
}
