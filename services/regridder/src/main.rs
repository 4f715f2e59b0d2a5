//! Regridder command-line tool.
//!
//! Applies a precomputed ESMF weight file to a gridded data file.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use regridder::{run, Args};

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let summary = run(&args)?;
    info!(
        input_shape = ?summary.input_shape,
        output_shape = ?summary.output_shape,
        weight_entries = summary.weight_entries,
        unmapped_cells = summary.unmapped_cells,
        "Regridding complete"
    );

    Ok(())
}
