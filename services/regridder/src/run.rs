//! One regridding run: load weights, read input, regrid, write output.

use anyhow::{Context, Result};
use regrid_core::{CacheStats, LayoutAdvisory, Regridder, WeightCache};
use tracing::{info, warn};

use crate::cli::Args;
use crate::data::{read_grid, write_grid};

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    pub weight_entries: usize,
    pub unmapped_cells: usize,
    pub advisory: Option<LayoutAdvisory>,
    pub cache: CacheStats,
}

pub fn run(args: &Args) -> Result<RunSummary> {
    let config = args.resolve_config()?;
    let mut cache = WeightCache::from_config(&config);
    let regridder = Regridder::from_config_with_cache(&config, &mut cache)
        .context("Failed to load weights")?;
    info!("{}", regridder);

    let input = read_grid(&args.input, &args.variable)?;
    info!(path = %args.input.display(), shape = ?input.shape(), "Read input");

    let regridded = regridder
        .regrid_with_diagnostics(&input)
        .with_context(|| format!("Failed to regrid {}", args.input.display()))?;

    if let Some(advisory) = &regridded.advisory {
        warn!(%advisory, "Input was not in standard layout");
    }

    write_grid(&args.output, &args.variable, &regridded.data)?;
    info!(
        path = %args.output.display(),
        shape = ?regridded.data.shape(),
        "Wrote output"
    );

    Ok(RunSummary {
        input_shape: input.shape().to_vec(),
        output_shape: regridded.data.shape().to_vec(),
        weight_entries: regridder.weights().nnz(),
        unmapped_cells: regridder.n_unmapped(),
        advisory: regridded.advisory,
        cache: cache.stats(),
    })
}
