//! Reading weight tables from disk.
//!
//! The format is chosen by file extension. JSON tables are always
//! supported; netCDF files written by ESMF need the `netcdf` feature.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::{RegridError, Result};
use crate::weights::WeightTable;

/// On-disk weight table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFileFormat {
    /// ESMF netCDF weight file (`.nc`, `.nc4`, `.cdf`).
    NetCdf,
    /// JSON table: `{"variables": {"col": [...], "row": [...], "S": [...]}}`.
    Json,
}

impl WeightFileFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "nc" | "nc4" | "cdf" | "netcdf" => Ok(Self::NetCdf),
            "json" => Ok(Self::Json),
            _ => Err(RegridError::UnsupportedFormat(format!(
                "cannot determine weight file format of {} (expected .nc or .json)",
                path.display()
            ))),
        }
    }

    /// Format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetCdf => "netcdf",
            Self::Json => "json",
        }
    }
}

/// Read a weight table from disk.
///
/// The file is opened, parsed and closed within this call.
pub fn read_weight_table(path: &Path) -> Result<WeightTable> {
    if !path.exists() {
        return Err(RegridError::not_found(path));
    }

    let format = WeightFileFormat::from_path(path)?;
    let table = match format {
        WeightFileFormat::Json => read_json(path)?,
        WeightFileFormat::NetCdf => read_netcdf(path)?,
    };

    info!(
        path = %path.display(),
        format = format.as_str(),
        variables = ?table.variables.keys().collect::<Vec<_>>(),
        "Loaded weight table"
    );
    Ok(table)
}

fn read_json(path: &Path) -> Result<WeightTable> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RegridError::not_found(path),
        _ => RegridError::Io(e),
    })?;
    let table = serde_json::from_reader(BufReader::new(file))?;
    Ok(table)
}

#[cfg(feature = "netcdf")]
fn read_netcdf(path: &Path) -> Result<WeightTable> {
    use crate::weights::{Column, TABLE_FIELDS};
    use netcdf_parser::NcValues;

    let nc = netcdf_parser::read_variables(path, &TABLE_FIELDS)?;

    let mut table = WeightTable::new();
    for (name, values) in nc.variables {
        let column = match values {
            NcValues::Int(v) => Column::Index(v),
            NcValues::Float(v) => Column::Real(v),
        };
        table = table.with_variable(name, column);
    }
    table.attributes = nc.attributes;
    Ok(table)
}

#[cfg(not(feature = "netcdf"))]
fn read_netcdf(path: &Path) -> Result<WeightTable> {
    Err(RegridError::UnsupportedFormat(format!(
        "{} is a netCDF file; rebuild with the `netcdf` feature to read it",
        path.display()
    )))
}
