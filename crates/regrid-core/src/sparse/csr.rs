//! Compressed sparse row storage used for multiplication.

use crate::types::GridValue;

/// Compressed sparse row matrix.
///
/// Row `i` holds `indices[indptr[i]..indptr[i + 1]]` with matching `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_out: usize,
    n_in: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// Build from coordinate entries already sorted by `(row, col)`.
    pub(crate) fn from_sorted_coo(
        n_out: usize,
        n_in: usize,
        rows: &[usize],
        cols: &[usize],
        values: &[f64],
    ) -> Self {
        let mut indptr = vec![0usize; n_out + 1];
        for &row in rows {
            indptr[row + 1] += 1;
        }
        for i in 0..n_out {
            indptr[i + 1] += indptr[i];
        }

        Self {
            n_out,
            n_in,
            indptr,
            indices: cols.to_vec(),
            data: values.to_vec(),
        }
    }

    /// Matrix shape `(n_out, n_in)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_out, self.n_in)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and values of one row.
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        let range = self.indptr[row]..self.indptr[row + 1];
        (&self.indices[range.clone()], &self.data[range])
    }

    /// Compute `y = A · x` for one flattened grid.
    ///
    /// `x` must have length `n_in` and `y` length `n_out`. Empty rows produce 0.
    #[inline]
    pub fn matvec_into<T>(&self, x: &[T], y: &mut [f64])
    where
        T: GridValue,
    {
        debug_assert_eq!(x.len(), self.n_in);
        debug_assert_eq!(y.len(), self.n_out);

        for (row, out) in y.iter_mut().enumerate() {
            let (cols, weights) = self.row(row);
            *out = cols
                .iter()
                .zip(weights)
                .fold(0.0, |acc, (&col, &w)| acc + w * x[col].to_f64());
        }
    }
}
