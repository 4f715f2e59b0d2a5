//! Missing-value propagation for unmapped destination cells.
//!
//! An empty row in the weight matrix regrids to `0.0`, which is
//! indistinguishable from a real zero. Putting a single NaN weight in each
//! empty row makes those cells come out as NaN instead. Column 0 is used for
//! the marker only because it always exists.

use tracing::debug;

use crate::sparse::SparseWeightMatrix;

/// Replace every empty row of `weights` with a single NaN entry at column 0.
///
/// Populated rows are left untouched and the shape is preserved. Applying this
/// twice is the same as applying it once. When no row is empty the input is
/// returned as-is, keeping its identity and any cached CSR form.
pub fn add_nans_to_weights(weights: &SparseWeightMatrix) -> SparseWeightMatrix {
    fill_empty_rows(weights, f64::NAN)
}

/// Like [`add_nans_to_weights`] with an arbitrary marker value.
pub fn fill_empty_rows(weights: &SparseWeightMatrix, marker: f64) -> SparseWeightMatrix {
    if weights.row_counts().iter().all(|&count| count > 0) {
        return weights.clone();
    }

    let mut builder = weights.to_row_builder();
    let filled = builder.fill_empty_rows(marker);
    if filled == 0 {
        // Only possible with zero source columns; there is nowhere to put a marker.
        return weights.clone();
    }

    debug!(
        n_out = weights.n_out(),
        filled,
        marker,
        "Filled empty weight rows"
    );
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partially_mapped() -> SparseWeightMatrix {
        // Row 1 has no entries.
        SparseWeightMatrix::from_coo(2, 2, vec![0, 0], vec![0, 1], vec![0.5, 0.5]).unwrap()
    }

    #[test]
    fn test_empty_row_gets_nan_at_column_zero() {
        let filled = add_nans_to_weights(&partially_mapped());

        assert_eq!(filled.shape(), (2, 2));
        assert_eq!(filled.nnz(), 3);
        assert!(filled.get(1, 0).unwrap().is_nan());
        assert_eq!(filled.get(1, 1), None);
        assert_eq!(filled.get(0, 0), Some(0.5));
        assert_eq!(filled.get(0, 1), Some(0.5));
        assert!(filled.empty_rows().is_empty());
    }

    #[test]
    fn test_fully_empty_matrix() {
        let filled = add_nans_to_weights(&SparseWeightMatrix::empty(3, 5));
        let entries: Vec<_> = filled.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(entries, vec![(0, 0), (1, 0), (2, 0)]);
        assert!(filled.iter().all(|(_, _, v)| v.is_nan()));
    }

    #[test]
    fn test_idempotent() {
        let once = add_nans_to_weights(&partially_mapped());
        let twice = add_nans_to_weights(&once);
        assert_eq!(once, twice);
        assert_eq!(once.id(), twice.id());
    }

    #[test]
    fn test_populated_matrix_unchanged() {
        let matrix = SparseWeightMatrix::identity(4);
        let _ = matrix.csr();

        let filled = add_nans_to_weights(&matrix);
        assert_eq!(filled, matrix);
        assert_eq!(filled.id(), matrix.id());
        assert!(filled.csr_is_cached());
    }

    #[test]
    fn test_custom_marker() {
        let filled = fill_empty_rows(&partially_mapped(), -9999.0);
        assert_eq!(filled.get(1, 0), Some(-9999.0));
    }

    #[test]
    fn test_no_source_columns() {
        let matrix = SparseWeightMatrix::empty(2, 0);
        let filled = add_nans_to_weights(&matrix);
        assert_eq!(filled.shape(), (2, 0));
        assert_eq!(filled.nnz(), 0);
    }
}
