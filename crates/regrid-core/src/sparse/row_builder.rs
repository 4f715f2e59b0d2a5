//! Per-row adjacency list for editing sparsity.

use crate::error::{RegridError, Result};
use crate::sparse::SparseWeightMatrix;

/// Mutable list-of-rows form of a weight matrix.
///
/// Each row keeps its `(col, value)` entries sorted by column. The builder is
/// only an intermediate: edits end with [`RowBuilder::finish`], which yields a
/// new immutable [`SparseWeightMatrix`].
#[derive(Debug, Clone)]
pub struct RowBuilder {
    n_out: usize,
    n_in: usize,
    rows: Vec<Vec<(usize, f64)>>,
}

impl RowBuilder {
    /// An empty builder of shape `(n_out, n_in)`.
    pub fn new(n_out: usize, n_in: usize) -> Self {
        Self {
            n_out,
            n_in,
            rows: vec![Vec::new(); n_out],
        }
    }

    pub(crate) fn from_matrix(matrix: &SparseWeightMatrix) -> Self {
        let mut builder = Self::new(matrix.n_out(), matrix.n_in());
        for (row, col, value) in matrix.iter() {
            builder.rows[row].push((col, value));
        }
        builder
    }

    /// Builder shape `(n_out, n_in)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_out, self.n_in)
    }

    /// Entries of one row, sorted by column.
    pub fn row(&self, row: usize) -> &[(usize, f64)] {
        &self.rows[row]
    }

    /// Indices of rows with no entries.
    pub fn empty_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, entries)| entries.is_empty().then_some(i))
            .collect()
    }

    /// Set the value at `(row, col)`, replacing any existing entry.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.n_out || col >= self.n_in {
            return Err(RegridError::invalid_weights(format!(
                "entry ({}, {}) is outside matrix shape ({}, {})",
                row, col, self.n_out, self.n_in
            )));
        }

        let entries = &mut self.rows[row];
        match entries.binary_search_by_key(&col, |&(c, _)| c) {
            Ok(pos) => entries[pos].1 = value,
            Err(pos) => entries.insert(pos, (col, value)),
        }
        Ok(())
    }

    /// Put a single `marker` entry at column 0 in every empty row.
    ///
    /// Returns the number of rows filled. Does nothing when there are no
    /// source columns to put the marker in.
    pub fn fill_empty_rows(&mut self, marker: f64) -> usize {
        if self.n_in == 0 {
            return 0;
        }

        let mut filled = 0;
        for entries in self.rows.iter_mut().filter(|entries| entries.is_empty()) {
            entries.push((0, marker));
            filled += 1;
        }
        filled
    }

    /// Finish into an immutable matrix.
    pub fn finish(self) -> SparseWeightMatrix {
        let nnz = self.rows.iter().map(Vec::len).sum();
        let mut rows = Vec::with_capacity(nnz);
        let mut cols = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        for (row, entries) in self.rows.into_iter().enumerate() {
            for (col, value) in entries {
                rows.push(row);
                cols.push(col);
                values.push(value);
            }
        }

        SparseWeightMatrix::from_sorted_parts(self.n_out, self.n_in, rows, cols, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_builder() {
        let matrix =
            SparseWeightMatrix::from_coo(3, 3, vec![0, 2, 2], vec![1, 0, 2], vec![1.0, 0.25, 0.75])
                .unwrap();
        let builder = matrix.to_row_builder();
        assert_eq!(builder.shape(), (3, 3));
        assert_eq!(builder.row(2), &[(0, 0.25), (2, 0.75)]);
        assert_eq!(builder.empty_rows(), vec![1]);

        let rebuilt = builder.finish();
        assert_eq!(rebuilt, matrix);
        assert_ne!(rebuilt.id(), matrix.id());
    }

    #[test]
    fn test_set_keeps_columns_sorted() {
        let mut builder = RowBuilder::new(1, 4);
        builder.set(0, 3, 3.0).unwrap();
        builder.set(0, 1, 1.0).unwrap();
        builder.set(0, 3, 30.0).unwrap();
        assert_eq!(builder.row(0), &[(1, 1.0), (3, 30.0)]);

        assert!(builder.set(0, 4, 1.0).is_err());
        assert!(builder.set(1, 0, 1.0).is_err());
    }

    #[test]
    fn test_fill_empty_rows() {
        let mut builder = RowBuilder::new(3, 2);
        builder.set(1, 1, 0.5).unwrap();
        assert_eq!(builder.fill_empty_rows(-1.0), 2);
        assert_eq!(builder.row(0), &[(0, -1.0)]);
        assert_eq!(builder.row(1), &[(1, 0.5)]);
        assert_eq!(builder.fill_empty_rows(-1.0), 0);
    }

    #[test]
    fn test_fill_without_columns_is_noop() {
        let mut builder = RowBuilder::new(2, 0);
        assert_eq!(builder.fill_empty_rows(f64::NAN), 0);
        assert_eq!(builder.empty_rows(), vec![0, 1]);
    }
}
