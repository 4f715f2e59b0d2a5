//! Sparse weight matrix.
//!
//! [`SparseWeightMatrix`] is the canonical, immutable form of a set of
//! regridding weights. It stores coalesced coordinate entries in row-major
//! order and lazily derives a [`CsrMatrix`] for multiplication. The CSR form
//! is built at most once per matrix value and shared read-only afterwards.
//!
//! Sparsity changes go through [`RowBuilder`], a per-row adjacency list that
//! is finished back into a new immutable matrix.

mod csr;
mod row_builder;

pub use csr::CsrMatrix;
pub use row_builder::RowBuilder;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{RegridError, Result};
use crate::types::WeightTriplet;

/// Identity of a matrix value.
///
/// Every constructed matrix gets a fresh id; clones share it. Used to key
/// cached derived forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatrixId(u64);

impl MatrixId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// An `(n_out, n_in)` sparse matrix of regridding weights.
#[derive(Debug, Clone)]
pub struct SparseWeightMatrix {
    id: MatrixId,
    n_out: usize,
    n_in: usize,
    // Sorted by (row, col), no duplicate coordinates.
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    csr: OnceLock<Arc<CsrMatrix>>,
}

impl SparseWeightMatrix {
    /// Build a matrix of shape `(n_out, n_in)` from a triplet.
    ///
    /// Duplicate `(row, col)` entries are summed. The shape is taken as given,
    /// never inferred from the indices; an index outside it is an error.
    pub fn from_triplet(triplet: &WeightTriplet, n_out: usize, n_in: usize) -> Result<Self> {
        let mut entries: Vec<(usize, usize, f64)> = Vec::with_capacity(triplet.len());

        for (i, (row, col, value)) in triplet.iter().enumerate() {
            if row >= n_out {
                return Err(RegridError::invalid_weights(format!(
                    "row index {} at position {} is out of range for n_out = {}",
                    row, i, n_out
                )));
            }
            if col >= n_in {
                return Err(RegridError::invalid_weights(format!(
                    "col index {} at position {} is out of range for n_in = {}",
                    col, i, n_in
                )));
            }
            entries.push((row, col, value));
        }

        // Stable sort keeps input order among duplicates, so sums are deterministic.
        entries.sort_by_key(|&(row, col, _)| (row, col));

        let mut rows = Vec::with_capacity(entries.len());
        let mut cols = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());

        for (row, col, value) in entries {
            if rows.last() == Some(&row) && cols.last() == Some(&col) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                rows.push(row);
                cols.push(col);
                values.push(value);
            }
        }

        let duplicates = triplet.len() - values.len();
        debug!(
            n_out,
            n_in,
            nnz = values.len(),
            duplicates,
            "Built sparse weight matrix"
        );

        Ok(Self::from_sorted_parts(n_out, n_in, rows, cols, values))
    }

    /// Build a matrix from 0-based coordinate columns.
    pub fn from_coo(
        n_out: usize,
        n_in: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let triplet = WeightTriplet::new(rows, cols, values)?;
        Self::from_triplet(&triplet, n_out, n_in)
    }

    /// A matrix with no entries.
    pub fn empty(n_out: usize, n_in: usize) -> Self {
        Self::from_sorted_parts(n_out, n_in, Vec::new(), Vec::new(), Vec::new())
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_sorted_parts(n, n, (0..n).collect(), (0..n).collect(), vec![1.0; n])
    }

    /// Callers must pass entries sorted by `(row, col)`, unique and in bounds.
    pub(crate) fn from_sorted_parts(
        n_out: usize,
        n_in: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        Self {
            id: MatrixId::next(),
            n_out,
            n_in,
            rows,
            cols,
            values,
            csr: OnceLock::new(),
        }
    }

    /// Identity of this matrix value.
    pub fn id(&self) -> MatrixId {
        self.id
    }

    /// Matrix shape `(n_out, n_in)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_out, self.n_in)
    }

    /// Number of destination cells (rows).
    pub fn n_out(&self) -> usize {
        self.n_out
    }

    /// Number of source cells (columns).
    pub fn n_in(&self) -> usize {
        self.n_in
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(row, col, value)` entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// Look up the stored value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let start = self.rows.partition_point(|&r| r < row);
        let end = self.rows.partition_point(|&r| r <= row);
        let offset = self.cols[start..end].binary_search(&col).ok()?;
        Some(self.values[start + offset])
    }

    /// Number of stored entries in each row.
    pub fn row_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_out];
        for &row in &self.rows {
            counts[row] += 1;
        }
        counts
    }

    /// Indices of rows with no entries (unmapped destination cells).
    pub fn empty_rows(&self) -> Vec<usize> {
        self.row_counts()
            .iter()
            .enumerate()
            .filter_map(|(row, &count)| (count == 0).then_some(row))
            .collect()
    }

    /// Convert back to a 0-based triplet.
    pub fn to_triplet(&self) -> WeightTriplet {
        WeightTriplet::from_parts(self.rows.clone(), self.cols.clone(), self.values.clone())
    }

    /// Row-major traversal form, built on first use and cached for this matrix value.
    pub fn csr(&self) -> Arc<CsrMatrix> {
        Arc::clone(self.csr.get_or_init(|| {
            debug!(id = self.id.0, nnz = self.nnz(), "Building CSR form");
            Arc::new(CsrMatrix::from_sorted_coo(
                self.n_out,
                self.n_in,
                &self.rows,
                &self.cols,
                &self.values,
            ))
        }))
    }

    /// Whether the CSR form has already been built.
    pub fn csr_is_cached(&self) -> bool {
        self.csr.get().is_some()
    }

    /// Start a sparsity edit from this matrix.
    pub fn to_row_builder(&self) -> RowBuilder {
        RowBuilder::from_matrix(self)
    }
}

impl PartialEq for SparseWeightMatrix {
    /// Structural equality: same shape and entries. NaN markers compare equal.
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.rows == other.rows
            && self.cols == other.cols
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}
