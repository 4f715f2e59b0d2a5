//! Native NetCDF access using the netcdf library.
//!
//! Files are opened, read and closed within a single call: the `netcdf::File`
//! handle is dropped on every return path, including errors.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use netcdf::types::NcVariableType;
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// This function disables that output by calling H5Eset_auto2 with null handlers.
/// It only needs to be called once per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Values of one variable, flattened in C order.
#[derive(Debug, Clone, PartialEq)]
pub enum NcValues {
    /// Integer variable (any width), widened to i64.
    Int(Vec<i64>),
    /// Floating point variable, widened to f64.
    Float(Vec<f64>),
}

impl NcValues {
    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    /// Check if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A set of variables read from one file.
#[derive(Debug, Clone, Default)]
pub struct NcTable {
    /// Variables that were found, by name.
    pub variables: BTreeMap<String, NcValues>,
    /// Requested variables that the file does not contain.
    pub missing: Vec<String>,
    /// Global attributes rendered as strings.
    pub attributes: BTreeMap<String, String>,
}

/// Read the named variables from a NetCDF file.
///
/// Variables that are absent are listed in [`NcTable::missing`] rather than
/// failing the read, so callers can report every missing name at once.
pub fn read_variables(path: &Path, names: &[&str]) -> NetCdfResult<NcTable> {
    if !path.exists() {
        return Err(NetCdfError::NotFound(path.to_path_buf()));
    }

    silence_hdf5_errors();

    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let mut table = NcTable::default();

    for attr in file.attributes() {
        let value = match attr.value() {
            Ok(netcdf::AttributeValue::Str(s)) => s,
            Ok(other) => format!("{:?}", other),
            Err(_) => continue,
        };
        table.attributes.insert(attr.name().to_string(), value);
    }

    for &name in names {
        let Some(var) = file.variable(name) else {
            table.missing.push(name.to_string());
            continue;
        };

        let values = match var.vartype() {
            NcVariableType::Int(_) => NcValues::Int(
                var.get_values::<i64, _>(..)
                    .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?,
            ),
            NcVariableType::Float(_) => NcValues::Float(
                var.get_values::<f64, _>(..)
                    .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?,
            ),
            other => {
                return Err(NetCdfError::InvalidFormat(format!(
                    "variable {} has non-numeric type {:?}",
                    name, other
                )))
            }
        };

        debug!(variable = name, len = values.len(), "Read NetCDF variable");
        table.variables.insert(name.to_string(), values);
    }

    Ok(table)
}

/// Read one numeric variable as an N-dimensional `f64` array.
pub fn read_array(path: &Path, name: &str) -> NetCdfResult<ArrayD<f64>> {
    if !path.exists() {
        return Err(NetCdfError::NotFound(path.to_path_buf()));
    }

    silence_hdf5_errors();

    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;

    ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| NetCdfError::InvalidFormat(format!("{} has inconsistent shape: {}", name, e)))
}

/// Write an array as a new NetCDF file with one `f64` variable.
///
/// `dims` names each axis of `array`, outermost first.
pub fn write_array<S, D>(
    path: &Path,
    name: &str,
    dims: &[&str],
    array: &ArrayBase<S, D>,
) -> NetCdfResult<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if dims.len() != array.ndim() {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} dimension names given for a {}-dimensional array",
            dims.len(),
            array.ndim()
        )));
    }

    silence_hdf5_errors();

    let mut file = netcdf::create(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to create NetCDF: {}", e)))?;

    for (&dim, &len) in dims.iter().zip(array.shape()) {
        file.add_dimension(dim, len)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to add dimension {}: {}", dim, e)))?;
    }

    let mut var = file
        .add_variable::<f64>(name, dims)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to add variable {}: {}", name, e)))?;

    let contiguous = array.as_standard_layout();
    let values = contiguous
        .as_slice()
        .ok_or_else(|| NetCdfError::InvalidFormat("array is not contiguous".to_string()))?;

    var.put_values(values, ..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to write {}: {}", name, e)))?;

    Ok(())
}
