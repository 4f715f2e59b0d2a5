//! Configuration for regridding.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegridError, Result};
use crate::types::GridShape;

/// Configuration for a regridding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridConfig {
    /// Path to the weight file (netCDF or JSON).
    pub weights_path: Option<PathBuf>,

    /// Horizontal shape of the source grid.
    pub shape_in: Option<GridShape>,

    /// Horizontal shape of the destination grid.
    pub shape_out: Option<GridShape>,

    /// Regrid unmapped destination cells to NaN instead of 0.
    pub unmapped_to_nan: bool,

    /// Number of weight matrices kept in the weight cache.
    pub weight_cache_entries: usize,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            weights_path: None,
            shape_in: None,
            shape_out: None,
            unmapped_to_nan: false,
            weight_cache_entries: 8,
        }
    }
}

impl RegridConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegridError::not_found(path));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Overlay values from environment variables onto this configuration.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("REGRID_WEIGHTS") {
            self.weights_path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("REGRID_SHAPE_IN") {
            self.shape_in = Some(val.parse()?);
        }

        if let Ok(val) = std::env::var("REGRID_SHAPE_OUT") {
            self.shape_out = Some(val.parse()?);
        }

        if let Ok(val) = std::env::var("REGRID_UNMAPPED_TO_NAN") {
            self.unmapped_to_nan = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("REGRID_WEIGHT_CACHE_ENTRIES") {
            self.weight_cache_entries = val.trim().parse().map_err(|_| {
                RegridError::config(format!(
                    "REGRID_WEIGHT_CACHE_ENTRIES must be a non-negative integer, got '{}'",
                    val
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.weights_path.is_none() {
            return Err(RegridError::config("weights_path must be set"));
        }

        match (self.shape_in, self.shape_out) {
            (Some(shape_in), Some(shape_out)) => {
                if shape_in.checked_len()? == 0 {
                    return Err(RegridError::config("shape_in must have at least one cell"));
                }
                if shape_out.checked_len()? == 0 {
                    return Err(RegridError::config("shape_out must have at least one cell"));
                }
            }
            _ => return Err(RegridError::config("shape_in and shape_out must be set")),
        }

        if self.weight_cache_entries == 0 {
            return Err(RegridError::config("weight_cache_entries must be > 0"));
        }

        Ok(())
    }
}
