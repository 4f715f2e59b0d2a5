//! Generators for test grids and weight triplets.
//!
//! Grids are produced as `ndarray` arrays in standard (row-major) layout.
//! Weight triplets use ESMF conventions: 1-based `row`/`col` indices with
//! destination rows in `row` and source columns in `col`.

use ndarray::{Array2, Array3};

/// 1-based weight triplet as it appears in an ESMF weight file.
#[derive(Debug, Clone, PartialEq)]
pub struct EsmfTriplet {
    pub row: Vec<i64>,
    pub col: Vec<i64>,
    pub s: Vec<f64>,
}

impl EsmfTriplet {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.s.len()
    }

    /// True if the triplet has no entries.
    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }
}

/// Creates a grid where each value encodes its position.
///
/// The value at `(row, col)` is `col * 1000 + row`, so a regridded cell
/// can be traced back to the source cells that contributed to it.
pub fn ramp_grid(ny: usize, nx: usize) -> Array2<f64> {
    Array2::from_shape_fn((ny, nx), |(row, col)| (col * 1000 + row) as f64)
}

/// Creates a stack of `nt` ramp grids, offset by `t * 0.5` per slice.
pub fn ramp_stack(nt: usize, ny: usize, nx: usize) -> Array3<f64> {
    Array3::from_shape_fn((nt, ny, nx), |(t, row, col)| {
        (col * 1000 + row) as f64 + t as f64 * 0.5
    })
}

/// Identity weights for a grid of `n` cells.
pub fn identity_triplet(n: usize) -> EsmfTriplet {
    let idx: Vec<i64> = (1..=n as i64).collect();
    EsmfTriplet {
        row: idx.clone(),
        col: idx,
        s: vec![1.0; n],
    }
}

/// Weights averaging non-overlapping `factor x factor` blocks.
///
/// Maps a `(ny, nx)` source grid onto `(ny / factor, nx / factor)`. Trailing
/// rows and columns that do not fill a whole block are left unused.
pub fn block_average_triplet(ny: usize, nx: usize, factor: usize) -> EsmfTriplet {
    let ny_out = ny / factor;
    let nx_out = nx / factor;
    let w = 1.0 / (factor * factor) as f64;

    let mut triplet = EsmfTriplet {
        row: Vec::new(),
        col: Vec::new(),
        s: Vec::new(),
    };

    for j in 0..ny_out {
        for i in 0..nx_out {
            let dst = (j * nx_out + i) as i64 + 1;
            for dj in 0..factor {
                for di in 0..factor {
                    let src = ((j * factor + dj) * nx + (i * factor + di)) as i64 + 1;
                    triplet.row.push(dst);
                    triplet.col.push(src);
                    triplet.s.push(w);
                }
            }
        }
    }

    triplet
}
