//! Core types for regridding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegridError, Result};

/// The horizontal shape of a grid: `(ny, nx)`.
///
/// Curvilinear and unstructured grids are described by whatever 2D
/// flattening the weights were generated for; only the product matters
/// to the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub ny: usize,
    pub nx: usize,
}

impl GridShape {
    /// Create a new grid shape.
    pub fn new(ny: usize, nx: usize) -> Self {
        Self { ny, nx }
    }

    /// Total number of cells (`ny * nx`), saturating at `usize::MAX`.
    ///
    /// Use [`GridShape::checked_len`] where the shape comes from user input.
    pub fn len(&self) -> usize {
        self.ny.saturating_mul(self.nx)
    }

    /// Total number of cells, or a config error if `ny * nx` overflows.
    pub fn checked_len(&self) -> Result<usize> {
        self.ny.checked_mul(self.nx).ok_or_else(|| {
            RegridError::config(format!("grid shape {} has too many cells", self))
        })
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The shape as an `(ny, nx)` tuple.
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }
}

impl From<(usize, usize)> for GridShape {
    fn from((ny, nx): (usize, usize)) -> Self {
        Self::new(ny, nx)
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ny, self.nx)
    }
}

impl FromStr for GridShape {
    type Err = RegridError;

    /// Parse `"NYxNX"` (also accepts `"NY,NX"`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (ny, nx) = s
            .split_once(['x', 'X', ','])
            .ok_or_else(|| RegridError::config(format!("invalid grid shape '{}', expected NYxNX", s)))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| RegridError::config(format!("invalid grid shape '{}', expected NYxNX", s)))
        };

        let shape = Self::new(parse(ny)?, parse(nx)?);
        shape.checked_len()?;
        Ok(shape)
    }
}

/// Element types that can be regridded.
///
/// Values are widened to `f64`, the weight type, before multiplying.
/// 64-bit integers may lose precision above 2^53.
pub trait GridValue: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_grid_value {
    ($($t:ty),*) => {
        $(
            impl GridValue for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_grid_value!(f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Coordinate-style weights: one `(row, col, value)` entry per destination/source pair.
///
/// Indices are 0-based. The three columns always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTriplet {
    row: Vec<usize>,
    col: Vec<usize>,
    value: Vec<f64>,
}

impl WeightTriplet {
    /// Create a triplet from 0-based indices.
    pub fn new(row: Vec<usize>, col: Vec<usize>, value: Vec<f64>) -> Result<Self> {
        check_lengths(row.len(), col.len(), value.len())?;
        Ok(Self { row, col, value })
    }

    /// Callers guarantee equal lengths.
    pub(crate) fn from_parts(row: Vec<usize>, col: Vec<usize>, value: Vec<f64>) -> Self {
        Self { row, col, value }
    }

    /// Create a triplet from 1-based indices, as written by ESMF.
    ///
    /// Every index is decremented by one; an index below 1 is rejected since it
    /// would become negative.
    pub fn from_one_based(row: &[i64], col: &[i64], value: Vec<f64>) -> Result<Self> {
        check_lengths(row.len(), col.len(), value.len())?;

        Ok(Self {
            row: decrement("row", row)?,
            col: decrement("col", col)?,
            value,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Destination (row) indices.
    pub fn rows(&self) -> &[usize] {
        &self.row
    }

    /// Source (column) indices.
    pub fn cols(&self) -> &[usize] {
        &self.col
    }

    /// Weight values.
    pub fn values(&self) -> &[f64] {
        &self.value
    }

    /// Iterate over `(row, col, value)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.row
            .iter()
            .zip(&self.col)
            .zip(&self.value)
            .map(|((&r, &c), &v)| (r, c, v))
    }
}

fn check_lengths(rows: usize, cols: usize, values: usize) -> Result<()> {
    if rows != cols || rows != values {
        return Err(RegridError::invalid_weights(format!(
            "row, col and value columns must have equal lengths, got {}, {} and {}",
            rows, cols, values
        )));
    }
    Ok(())
}

fn decrement(name: &str, indices: &[i64]) -> Result<Vec<usize>> {
    indices
        .iter()
        .enumerate()
        .map(|(i, &idx)| {
            if idx < 1 {
                Err(RegridError::invalid_weights(format!(
                    "{} index {} at position {} is not a valid 1-based index",
                    name, idx, i
                )))
            } else {
                Ok((idx - 1) as usize)
            }
        })
        .collect()
}
