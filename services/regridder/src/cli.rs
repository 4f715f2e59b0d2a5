//! Command-line arguments and their merge with file/environment configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use regrid_core::{GridShape, RegridConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "regridder")]
#[command(about = "Regrid gridded data with precomputed ESMF weights")]
pub struct Args {
    /// Weight file (.nc or .json)
    #[arg(short, long)]
    pub weights: Option<PathBuf>,

    /// Source grid shape as NYxNX
    #[arg(long)]
    pub shape_in: Option<GridShape>,

    /// Destination grid shape as NYxNX
    #[arg(long)]
    pub shape_out: Option<GridShape>,

    /// Input data file (.json grid document or .nc)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output data file (.json grid document or .nc)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Data variable to read from and write to netCDF files
    #[arg(long, default_value = "data")]
    pub variable: String,

    /// Write NaN to destination cells no source cell maps to
    #[arg(long)]
    pub unmapped_to_nan: bool,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "REGRID_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Build the effective configuration.
    ///
    /// Precedence, lowest first: defaults, `--config` file, `REGRID_*`
    /// environment variables, command-line flags.
    pub fn resolve_config(&self) -> Result<RegridConfig> {
        let mut config = match &self.config {
            Some(path) => RegridConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RegridConfig::default(),
        };

        config
            .apply_env()
            .context("Invalid REGRID_* environment variable")?;

        if let Some(weights) = &self.weights {
            config.weights_path = Some(weights.clone());
        }
        if let Some(shape) = self.shape_in {
            config.shape_in = Some(shape);
        }
        if let Some(shape) = self.shape_out {
            config.shape_out = Some(shape);
        }
        if self.unmapped_to_nan {
            config.unmapped_to_nan = true;
        }

        config.validate()?;
        Ok(config)
    }
}
