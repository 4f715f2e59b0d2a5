//! Reading and writing gridded data files.
//!
//! JSON grid documents look like `{"shape": [2, 3], "data": [...]}` with
//! values in row-major order and `null` for NaN. netCDF files need the
//! `netcdf` feature.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// Data file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    NetCdf,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "nc" | "nc4" | "cdf" | "netcdf" => Ok(Self::NetCdf),
            _ => bail!(
                "Cannot determine data format of {} (expected .json or .nc)",
                path.display()
            ),
        }
    }
}

/// A grid serialized as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    pub shape: Vec<usize>,
    pub data: Vec<Option<f64>>,
}

impl GridDocument {
    pub fn from_array(array: &ArrayD<f64>) -> Self {
        Self {
            shape: array.shape().to_vec(),
            data: array
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect(),
        }
    }

    pub fn into_array(self) -> Result<ArrayD<f64>> {
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            bail!(
                "Grid document shape {:?} needs {} values, found {}",
                self.shape,
                expected,
                self.data.len()
            );
        }

        let values = self.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Ok(ArrayD::from_shape_vec(IxDyn(&self.shape), values)?)
    }
}

/// Read a data array. `variable` selects the netCDF variable.
pub fn read_grid(path: &Path, variable: &str) -> Result<ArrayD<f64>> {
    match DataFormat::from_path(path)? {
        DataFormat::Json => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let doc: GridDocument = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid grid document {}", path.display()))?;
            doc.into_array()
        }
        DataFormat::NetCdf => read_netcdf(path, variable),
    }
}

/// Write a data array, replacing any existing file.
pub fn write_grid(path: &Path, variable: &str, array: &ArrayD<f64>) -> Result<()> {
    match DataFormat::from_path(path)? {
        DataFormat::Json => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_json::to_writer(BufWriter::new(file), &GridDocument::from_array(array))?;
            Ok(())
        }
        DataFormat::NetCdf => write_netcdf(path, variable, array),
    }
}

/// Dimension names for an output array: `dim_0, dim_1, ..., y, x`.
pub fn dimension_names(ndim: usize) -> Vec<String> {
    let extra = ndim.saturating_sub(2);
    let mut names: Vec<String> = (0..extra).map(|i| format!("dim_{}", i)).collect();
    names.extend(["y", "x"].iter().skip(2 - ndim.min(2)).map(|s| s.to_string()));
    names
}

#[cfg(feature = "netcdf")]
fn read_netcdf(path: &Path, variable: &str) -> Result<ArrayD<f64>> {
    netcdf_parser::read_array(path, variable)
        .with_context(|| format!("Failed to read {} from {}", variable, path.display()))
}

#[cfg(feature = "netcdf")]
fn write_netcdf(path: &Path, variable: &str, array: &ArrayD<f64>) -> Result<()> {
    let names = dimension_names(array.ndim());
    let dims: Vec<&str> = names.iter().map(String::as_str).collect();
    netcdf_parser::write_array(path, variable, &dims, array)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(not(feature = "netcdf"))]
fn read_netcdf(path: &Path, _variable: &str) -> Result<ArrayD<f64>> {
    bail!(
        "{} is a netCDF file; rebuild with the `netcdf` feature to read it",
        path.display()
    )
}

#[cfg(not(feature = "netcdf"))]
fn write_netcdf(path: &Path, _variable: &str, _array: &ArrayD<f64>) -> Result<()> {
    bail!(
        "{} is a netCDF file; rebuild with the `netcdf` feature to write it",
        path.display()
    )
}
