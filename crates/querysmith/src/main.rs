//! querysmith CLI
//!
//! Runs the fixed generation pipeline once over a workspace directory.
//! There is no further protocol: run, annotate the JSON artifacts the run
//! leaves behind, run again.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use querysmith_core::pipeline::OUTPUT_FILE;
use querysmith_core::prelude::*;

/// Human-in-the-loop SQL SELECT generation.
#[derive(Parser)]
#[command(name = "querysmith")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace directory holding the source listing and artifacts.
    #[arg(short, long, env = "QUERYSMITH_WORKSPACE", default_value = "workspace")]
    workspace: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = ArtifactStore::new(&cli.workspace);
    let output = store.path(OUTPUT_FILE);

    let sql = Pipeline::new(store).run()?;
    if sql.is_empty() {
        info!(
            "Nothing generated. Put a `columns.csv` listing into {} and re-run.",
            cli.workspace.display()
        );
    } else {
        info!("Query written to {}", output.display());
    }

    Ok(())
}
