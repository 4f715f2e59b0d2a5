//! Integration tests: weight files on disk through to regridded arrays.
//!
//! Weight files are generated into temporary directories, so these tests
//! need no committed data. netCDF tests run only with the `netcdf` feature.

use std::sync::Arc;

use ndarray::{arr1, arr2, Array2, Axis};
use regrid_core::{
    add_nans_to_weights, apply_weights, apply_weights_with_diagnostics, read_weights, GridShape,
    IndexMapping, RegridError, Regridder, SparseWeightMatrix, WeightCache, WeightTable,
};
use serde_json::json;
use test_utils::{
    assert_approx_eq, assert_slice_approx_eq, block_average_triplet, identity_triplet, ramp_grid,
    ramp_stack, shapes, temp_test_dir, write_json, write_weight_json,
};

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_json_file_matches_in_memory_table() {
    let dir = temp_test_dir();
    let (ny, nx) = shapes::FINE;
    let triplet = block_average_triplet(ny, nx, 2);
    let path = write_weight_json(dir.path(), "weights.json", &triplet);

    let n_in = ny * nx;
    let n_out = (ny / 2) * (nx / 2);
    let from_file = read_weights(path.as_path(), n_in, n_out).unwrap();
    let from_table = read_weights(
        WeightTable::esmf(triplet.row.clone(), triplet.col.clone(), triplet.s.clone()),
        n_in,
        n_out,
    )
    .unwrap();

    assert_eq!(from_file, from_table);
    assert_ne!(from_file.id(), from_table.id());
}

#[test]
fn test_mapping_matches_table() {
    let table = WeightTable::esmf(vec![1, 2], vec![2, 1], vec![1.0, 1.0]);
    let mapping = IndexMapping::new(vec![2, 1], vec![1, 2], vec![1.0, 1.0]);

    assert_eq!(
        read_weights(table, 2, 2).unwrap(),
        read_weights(mapping, 2, 2).unwrap()
    );
}

#[test]
fn test_file_missing_fields_lists_them() {
    let dir = temp_test_dir();
    let path = write_json(
        dir.path(),
        "weights.json",
        &json!({"variables": {"S": [1.0]}}),
    );

    let err = read_weights(path.as_path(), 1, 1).unwrap_err();
    match &err {
        RegridError::Schema { missing, .. } => {
            assert_eq!(missing, &vec!["col".to_string(), "row".to_string()]);
        }
        other => panic!("expected schema error, got {:?}", other),
    }
    assert!(err.to_string().contains("col, row"));
}

#[test]
fn test_nonexistent_path() {
    let err = read_weights("/definitely/not/here/weights.nc", 4, 4).unwrap_err();
    assert!(matches!(err, RegridError::NotFound { .. }));
}

#[test]
fn test_shape_comes_from_grids_not_indices() {
    // Only the first of 3 destination cells is referenced.
    let table = WeightTable::esmf(vec![1], vec![1], vec![1.0]);
    let matrix = read_weights(table, 5, 3).unwrap();

    assert_eq!(matrix.shape(), (3, 5));
    assert_eq!(matrix.empty_rows(), vec![1, 2]);
}

#[test]
fn test_duplicate_entries_coalesce() {
    let table = WeightTable::esmf(vec![1, 1], vec![1, 1], vec![0.3, 0.2]);
    let matrix = read_weights(table, 2, 2).unwrap();

    assert_eq!(matrix.nnz(), 1);
    assert_approx_eq!(matrix.get(0, 0).unwrap(), 0.5, 1e-15);
}

// =============================================================================
// Applying
// =============================================================================

#[test]
fn test_identity_reproduces_input() {
    let t = identity_triplet(4);
    let weights = read_weights(WeightTable::esmf(t.row, t.col, t.s), 4, 4).unwrap();
    let shape = GridShape::new(2, 2);

    let stack = ramp_stack(3, 2, 2);
    let out = apply_weights(&weights, &stack, shape, shape).unwrap();
    assert_eq!(out, stack.into_dyn());
}

#[test]
fn test_block_average_of_ramp() {
    let (ny, nx) = shapes::FINE;
    let t = block_average_triplet(ny, nx, 2);
    let weights =
        read_weights(WeightTable::esmf(t.row, t.col, t.s), ny * nx, ny * nx / 4).unwrap();

    let grid = ramp_grid(ny, nx);
    let out = apply_weights(&weights, &grid, GridShape::new(ny, nx), shapes::COARSE.into())
        .unwrap();

    assert_eq!(out.shape(), &[2, 3]);
    for j in 0..2 {
        for i in 0..3 {
            // mean of cols 2i, 2i+1 and rows 2j, 2j+1
            let expected = (2 * i) as f64 * 1000.0 + 500.0 + (2 * j) as f64 + 0.5;
            assert_approx_eq!(out[[j, i]], expected, 1e-9);
        }
    }
}

#[test]
fn test_transposed_input_matches_standard_copy() {
    let (ny, nx) = shapes::TALL;
    let t = block_average_triplet(ny, nx, 1);
    let weights = read_weights(WeightTable::esmf(t.row, t.col, t.s), ny * nx, ny * nx).unwrap();
    let shape = GridShape::new(ny, nx);

    // Build a (ny, nx) view whose memory is column-major.
    let backing: Array2<f64> = ramp_grid(nx, ny);
    let view = backing.t();
    assert!(!view.is_standard_layout());

    let standard = view.to_owned();
    let from_view = apply_weights_with_diagnostics(&weights, &view, shape, shape).unwrap();
    let from_copy = apply_weights_with_diagnostics(&weights, &standard, shape, shape).unwrap();

    assert_eq!(from_view.data, from_copy.data);
    assert!(from_view.advisory.is_some());
    assert!(from_copy.advisory.is_none());
}

#[test]
fn test_trailing_shape_mismatch() {
    let weights = SparseWeightMatrix::identity(4);
    let data = Array2::<f64>::zeros((2, 3));

    let err = apply_weights(&weights, &data, GridShape::new(2, 2), GridShape::new(2, 2))
        .unwrap_err();
    assert!(matches!(err, RegridError::ShapeMismatch(_)));
}

#[test]
fn test_csr_built_once_per_matrix() {
    let weights = SparseWeightMatrix::identity(4);
    let shape = GridShape::new(2, 2);
    assert!(!weights.csr_is_cached());

    apply_weights(&weights, &ramp_grid(2, 2), shape, shape).unwrap();
    let first = weights.csr();
    apply_weights(&weights, &ramp_stack(2, 2, 2), shape, shape).unwrap();

    assert!(Arc::ptr_eq(&first, &weights.csr()));
}

// =============================================================================
// NaN fill
// =============================================================================

#[test]
fn test_nan_fill_scenario() {
    let weights = SparseWeightMatrix::from_coo(2, 2, vec![0], vec![0], vec![1.0]).unwrap();
    let filled = add_nans_to_weights(&weights);

    assert_eq!(filled.nnz(), 2);
    assert!(filled.get(1, 0).unwrap().is_nan());

    let data = arr2(&[[1.0, 2.0]]);
    let out = apply_weights(&filled, &data, GridShape::new(1, 2), GridShape::new(1, 2)).unwrap();
    assert_slice_approx_eq!(out.as_slice().unwrap(), [1.0, f64::NAN], 0.0);

    assert_eq!(add_nans_to_weights(&filled), filled);
}

#[test]
fn test_unmapped_row_is_zero_without_fill() {
    let weights = SparseWeightMatrix::from_coo(2, 2, vec![0], vec![0], vec![1.0]).unwrap();
    let data = arr1(&[1.0, 2.0]).insert_axis(Axis(0));

    let out = apply_weights(&weights, &data, GridShape::new(1, 2), GridShape::new(1, 2)).unwrap();
    assert_eq!(out[[0, 1]], 0.0);
}

// =============================================================================
// Cache and regridder
// =============================================================================

#[test]
fn test_weight_cache_shares_matrices() {
    let dir = temp_test_dir();
    let path = write_weight_json(dir.path(), "weights.json", &identity_triplet(4));
    let mut cache = WeightCache::new(2);

    let first = cache.get_or_load(&path, 4, 4).unwrap();
    let second = cache.get_or_load(&path, 4, 4).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);

    let shape = GridShape::new(2, 2);
    let a = Regridder::from_cache(&mut cache, &path, shape, shape, false).unwrap();
    let b = Regridder::from_cache(&mut cache, &path, shape, shape, false).unwrap();
    assert!(Arc::ptr_eq(a.weights(), b.weights()));
}

#[test]
fn test_regridder_with_unmapped_to_nan() {
    let dir = temp_test_dir();
    let path = write_weight_json(dir.path(), "weights.json", &block_average_triplet(3, 5, 2));

    // 3x5 source, 2x3 destination: only 1x2 blocks are mapped.
    let regridder =
        Regridder::new(path.as_path(), GridShape::new(3, 5), GridShape::new(2, 3), true).unwrap();
    assert_eq!(regridder.n_unmapped(), 4);

    let out = regridder.regrid(&ramp_grid(3, 5)).unwrap();
    let nan = f64::NAN;
    assert_slice_approx_eq!(
        out.as_slice().unwrap(),
        [500.5, 2500.5, nan, nan, nan, nan],
        1e-9
    );
}

// =============================================================================
// netCDF
// =============================================================================

#[cfg(feature = "netcdf")]
#[test]
fn test_netcdf_weights_missing_fields() {
    let dir = temp_test_dir();
    let path = dir.path().join("weights.nc");
    netcdf_parser::write_array(&path, "S", &["n_s"], &arr1(&[0.5, 0.5])).unwrap();

    let err = read_weights(path.as_path(), 2, 2).unwrap_err();
    assert!(matches!(err, RegridError::Schema { .. }));
    assert!(err.to_string().contains("col, row"));
}

#[cfg(feature = "netcdf")]
#[test]
fn test_esmf_weight_file() {
    let path = test_utils::require_test_file!("bilinear_4x5_2x2.nc");

    let weights = read_weights(path.as_path(), 20, 4).unwrap();
    assert_eq!(weights.shape(), (4, 20));
    assert!(weights.nnz() > 0);
}
