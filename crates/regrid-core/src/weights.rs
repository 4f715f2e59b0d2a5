//! Loading regridding weights from any supported source.
//!
//! ESMF describes the weight matrix as three co-indexed arrays: 1-based
//! destination indices, 1-based source indices, and weights. They arrive
//! on disk, as an already-loaded table, as an index mapping, or as a matrix
//! that was built elsewhere. [`read_weights`] turns any of these into a
//! [`SparseWeightMatrix`] of a caller-given shape.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RegridError, Result};
use crate::sparse::SparseWeightMatrix;
use crate::types::WeightTriplet;
use crate::weight_file;

/// Variables a weight table must expose.
pub const TABLE_FIELDS: [&str; 3] = ["col", "row", "S"];

/// Keys an index mapping must contain.
pub const MAPPING_KEYS: [&str; 3] = ["col_src", "row_dst", "weights"];

/// One named column of a weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Index(Vec<i64>),
    Real(Vec<f64>),
}

impl Column {
    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Self::Index(v) => v.len(),
            Self::Real(v) => v.len(),
        }
    }

    /// Check if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values as integer indices. Real columns must hold whole numbers.
    pub fn to_indices(&self, name: &str) -> Result<Vec<i64>> {
        match self {
            Self::Index(v) => Ok(v.clone()),
            Self::Real(v) => v
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    if x.is_finite() && x.fract() == 0.0 {
                        Ok(x as i64)
                    } else {
                        Err(RegridError::invalid_weights(format!(
                            "{} value {} at position {} is not an integer index",
                            name, x, i
                        )))
                    }
                })
                .collect(),
        }
    }

    /// Values as weights.
    pub fn to_values(&self) -> Vec<f64> {
        match self {
            Self::Index(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Real(v) => v.clone(),
        }
    }
}

/// A named-variable table, such as an ESMF weight dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub variables: BTreeMap<String, Column>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl WeightTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with the standard ESMF variables (1-based `row`, `col`).
    pub fn esmf(row: Vec<i64>, col: Vec<i64>, s: Vec<f64>) -> Self {
        Self::new()
            .with_variable("row", Column::Index(row))
            .with_variable("col", Column::Index(col))
            .with_variable("S", Column::Real(s))
    }

    /// Add or replace a variable.
    pub fn with_variable(mut self, name: impl Into<String>, column: Column) -> Self {
        self.variables.insert(name.into(), column);
        self
    }

    /// Add or replace a global attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Column> {
        self.variables.get(name)
    }

    /// Check if a variable exists.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Convert to a 0-based triplet.
    pub fn to_triplet(&self) -> Result<WeightTriplet> {
        let missing: Vec<&str> = TABLE_FIELDS
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(RegridError::schema("weights dataset", missing));
        }

        let (Some(col), Some(row), Some(s)) = (
            self.variable("col"),
            self.variable("row"),
            self.variable("S"),
        ) else {
            return Err(RegridError::schema("weights dataset", TABLE_FIELDS));
        };

        WeightTriplet::from_one_based(&row.to_indices("row")?, &col.to_indices("col")?, s.to_values())
    }
}

/// Weights keyed the way ESMPy's `get_weights_dict` returns them (1-based indices).
///
/// Keys are optional so that a mapping read from an external document can be
/// reported precisely when incomplete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    pub col_src: Option<Vec<i64>>,
    pub row_dst: Option<Vec<i64>>,
    pub weights: Option<Vec<f64>>,
}

impl IndexMapping {
    /// A complete mapping.
    pub fn new(col_src: Vec<i64>, row_dst: Vec<i64>, weights: Vec<f64>) -> Self {
        Self {
            col_src: Some(col_src),
            row_dst: Some(row_dst),
            weights: Some(weights),
        }
    }

    /// Convert to a 0-based triplet.
    pub fn to_triplet(&self) -> Result<WeightTriplet> {
        match (&self.col_src, &self.row_dst, &self.weights) {
            (Some(col), Some(row), Some(weights)) => {
                WeightTriplet::from_one_based(row, col, weights.clone())
            }
            (col, row, weights) => {
                let present = [col.is_some(), row.is_some(), weights.is_some()];
                let missing = MAPPING_KEYS
                    .iter()
                    .zip(present)
                    .filter_map(|(&key, present)| (!present).then_some(key));
                Err(RegridError::schema("weights mapping", missing))
            }
        }
    }
}

/// Where regridding weights come from.
#[derive(Debug, Clone)]
pub enum WeightSource {
    /// A weight file on disk (netCDF or JSON) with `col`, `row`, `S`.
    File(PathBuf),
    /// An already-loaded weight table with `col`, `row`, `S`.
    Table(WeightTable),
    /// A mapping with `col_src`, `row_dst`, `weights`.
    Mapping(IndexMapping),
    /// A 0-based matrix, used as-is.
    Prebuilt(SparseWeightMatrix),
}

impl From<PathBuf> for WeightSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for WeightSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<&str> for WeightSource {
    fn from(path: &str) -> Self {
        Self::File(PathBuf::from(path))
    }
}

impl From<WeightTable> for WeightSource {
    fn from(table: WeightTable) -> Self {
        Self::Table(table)
    }
}

impl From<IndexMapping> for WeightSource {
    fn from(mapping: IndexMapping) -> Self {
        Self::Mapping(mapping)
    }
}

impl From<SparseWeightMatrix> for WeightSource {
    fn from(matrix: SparseWeightMatrix) -> Self {
        Self::Prebuilt(matrix)
    }
}

/// Weights normalized from a source, before the matrix is assembled.
#[derive(Debug, Clone)]
pub enum LoadedWeights {
    /// 0-based entries still to be assembled.
    Triplet(WeightTriplet),
    /// A matrix that bypasses assembly.
    Matrix(SparseWeightMatrix),
}

/// Normalize a weight source into 0-based entries.
pub fn load_weights(source: WeightSource) -> Result<LoadedWeights> {
    match source {
        WeightSource::File(path) => {
            let table = weight_file::read_weight_table(&path)?;
            Ok(LoadedWeights::Triplet(table.to_triplet()?))
        }
        WeightSource::Table(table) => Ok(LoadedWeights::Triplet(table.to_triplet()?)),
        WeightSource::Mapping(mapping) => Ok(LoadedWeights::Triplet(mapping.to_triplet()?)),
        WeightSource::Prebuilt(matrix) => Ok(LoadedWeights::Matrix(matrix)),
    }
}

/// Read regridding weights into a sparse matrix of shape `(n_out, n_in)`.
///
/// `n_in` and `n_out` are the total number of cells on the source and
/// destination grids. They must be given because unmapped cells leave no
/// trace in the weights, so the shape cannot be inferred from the indices.
///
/// A [`WeightSource::Prebuilt`] matrix is returned unchanged.
///
/// # Errors
///
/// - [`RegridError::NotFound`] if a weight file does not exist.
/// - [`RegridError::Schema`] if required variables or keys are missing.
/// - [`RegridError::InvalidWeights`] for structurally invalid indices.
pub fn read_weights(
    source: impl Into<WeightSource>,
    n_in: usize,
    n_out: usize,
) -> Result<SparseWeightMatrix> {
    match load_weights(source.into())? {
        LoadedWeights::Triplet(triplet) => {
            debug!(entries = triplet.len(), n_in, n_out, "Assembling weight matrix");
            SparseWeightMatrix::from_triplet(&triplet, n_out, n_in)
        }
        LoadedWeights::Matrix(matrix) => {
            if matrix.shape() != (n_out, n_in) {
                warn!(
                    matrix_shape = ?matrix.shape(),
                    requested = ?(n_out, n_in),
                    "Prebuilt weight matrix shape differs from requested shape, using it unchanged"
                );
            }
            Ok(matrix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_indices_are_decremented() {
        let table = WeightTable::esmf(vec![1, 2, 2], vec![2, 1, 3], vec![1.0, 0.4, 0.6]);
        let matrix = read_weights(table, 3, 2).unwrap();

        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.get(0, 1), Some(1.0));
        assert_eq!(matrix.get(1, 0), Some(0.4));
        assert_eq!(matrix.get(1, 2), Some(0.6));
    }

    #[test]
    fn test_table_missing_fields_named() {
        let table = WeightTable::new().with_variable("S", Column::Real(vec![1.0]));
        let err = read_weights(table, 1, 1).unwrap_err();

        assert!(matches!(err, RegridError::Schema { .. }));
        assert_eq!(err.missing_fields().unwrap(), &["col", "row"]);
        assert!(err.to_string().contains("col, row"));
    }

    #[test]
    fn test_table_real_index_columns() {
        let table = WeightTable::new()
            .with_variable("row", Column::Real(vec![1.0, 2.0]))
            .with_variable("col", Column::Real(vec![2.0, 1.0]))
            .with_variable("S", Column::Index(vec![1, 1]));
        let matrix = read_weights(table, 2, 2).unwrap();
        assert_eq!(matrix.get(0, 1), Some(1.0));
        assert_eq!(matrix.get(1, 0), Some(1.0));

        let table = WeightTable::esmf(vec![1], vec![1], vec![1.0])
            .with_variable("col", Column::Real(vec![1.5]));
        assert!(matches!(
            read_weights(table, 2, 2),
            Err(RegridError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_mapping_indices_are_decremented() {
        let mapping = IndexMapping::new(vec![1, 4], vec![1, 1], vec![0.25, 0.75]);
        let matrix = read_weights(mapping, 4, 1).unwrap();

        assert_eq!(matrix.get(0, 0), Some(0.25));
        assert_eq!(matrix.get(0, 3), Some(0.75));
    }

    #[test]
    fn test_mapping_missing_keys_named() {
        let mapping = IndexMapping {
            col_src: Some(vec![1]),
            row_dst: None,
            weights: None,
        };
        let err = read_weights(mapping, 1, 1).unwrap_err();
        assert_eq!(err.missing_fields().unwrap(), &["row_dst", "weights"]);
        assert!(err.to_string().contains("weights mapping"));
    }

    #[test]
    fn test_prebuilt_passes_through() {
        let matrix = SparseWeightMatrix::identity(3);
        let id = matrix.id();

        let loaded = read_weights(matrix, 3, 3).unwrap();
        assert_eq!(loaded.id(), id);

        // Shape is never adjusted for prebuilt matrices.
        let loaded = read_weights(SparseWeightMatrix::identity(3), 5, 5).unwrap();
        assert_eq!(loaded.shape(), (3, 3));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_weights(Path::new("/definitely/not/here.nc"), 4, 4).unwrap_err();
        assert!(matches!(err, RegridError::NotFound { .. }));
    }

    #[test]
    fn test_unmapped_cells_keep_shape() {
        // Only the first destination cell is mapped.
        let table = WeightTable::esmf(vec![1], vec![1], vec![1.0]);
        let matrix = read_weights(table, 4, 6).unwrap();
        assert_eq!(matrix.shape(), (6, 4));
        assert_eq!(matrix.empty_rows().len(), 5);
    }

    #[test]
    fn test_column_json_untagged() {
        let ints: Column = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(ints, Column::Index(vec![1, 2, 3]));

        let reals: Column = serde_json::from_str("[0.5, 1]").unwrap();
        assert_eq!(reals, Column::Real(vec![0.5, 1.0]));
    }
}
