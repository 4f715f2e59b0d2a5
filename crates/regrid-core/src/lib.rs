//! Sparse Weight-Matrix Regridding
//!
//! This crate applies precomputed regridding weights (as generated by ESMF)
//! to gridded data. It enables:
//!
//! - **Flexible weight sources**: netCDF/JSON weight files, in-memory tables,
//!   index mappings, or prebuilt matrices
//! - **Exact shapes**: the matrix shape comes from the grids, never from the
//!   largest index, so unmapped cells are preserved
//! - **Missing-value propagation**: optional NaN for unmapped destination cells
//! - **Reuse**: the multiplication form of a matrix is built once per matrix value
//!
//! # Architecture
//!
//! ```text
//! WeightSource (file / table / mapping / prebuilt)
//!      │
//!      ▼
//! read_weights(source, n_in, n_out)
//!      │
//!      ├─► Normalize to 0-based triplet (row-1, col-1, S)
//!      │
//!      └─► Assemble SparseWeightMatrix (n_out × n_in, duplicates summed)
//!               │
//!               ├─► [optional] add_nans_to_weights
//!               │
//!               ▼
//! apply_weights(matrix, data, shape_in, shape_out)
//!      │
//!      ├─► Flatten (..., ny_in, nx_in) → (extra, n_in)
//!      ├─► CSR multiply per extra slice
//!      └─► Unflatten → (..., ny_out, nx_out)
//! ```
//!
//! # Example
//!
//! ```
//! use ndarray::arr2;
//! use regrid_core::{apply_weights, read_weights, GridShape, WeightTable};
//!
//! // 1-based ESMF weights averaging a 2x2 grid onto a single cell.
//! let table = WeightTable::esmf(vec![1, 1, 1, 1], vec![1, 2, 3, 4], vec![0.25; 4]);
//! let weights = read_weights(table, 4, 1)?;
//!
//! let data = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
//! let out = apply_weights(&weights, &data, GridShape::new(2, 2), GridShape::new(1, 1))?;
//! assert_eq!(out[[0, 0]], 2.5);
//! # Ok::<(), regrid_core::RegridError>(())
//! ```

pub mod apply;
pub mod cache;
pub mod config;
pub mod error;
pub mod nan_fill;
pub mod regridder;
pub mod sparse;
pub mod types;
pub mod weight_file;
pub mod weights;

// Re-export commonly used types at crate root
pub use apply::{apply_weights, apply_weights_with_diagnostics, LayoutAdvisory, Regridded};
pub use cache::{CacheStats, WeightCache, WeightKey};
pub use config::RegridConfig;
pub use error::{RegridError, Result};
pub use nan_fill::{add_nans_to_weights, fill_empty_rows};
pub use regridder::Regridder;
pub use sparse::{CsrMatrix, MatrixId, RowBuilder, SparseWeightMatrix};
pub use types::{GridShape, GridValue, WeightTriplet};
pub use weight_file::{read_weight_table, WeightFileFormat};
pub use weights::{
    load_weights, read_weights, Column, IndexMapping, LoadedWeights, WeightSource, WeightTable,
    MAPPING_KEYS, TABLE_FIELDS,
};
