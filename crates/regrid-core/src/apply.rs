//! Applying a weight matrix to gridded data.
//!
//! The trailing two axes of the input are the horizontal grid. They are
//! flattened to `n_in` cells, multiplied by the `(n_out, n_in)` matrix, and
//! unflattened to the output grid. Leading axes (time, level, member, ...)
//! pass through in their original order.

use std::fmt;

use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use tracing::warn;

use crate::error::{RegridError, Result};
use crate::sparse::SparseWeightMatrix;
use crate::types::{GridShape, GridValue};

/// Non-fatal notice that the input array was not in standard (C-contiguous)
/// layout and had to be copied before multiplying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutAdvisory {
    /// Shape of the input array.
    pub shape: Vec<usize>,
    /// Strides of the input array, in elements.
    pub strides: Vec<isize>,
    /// Number of elements copied into standard layout.
    pub copied_elements: usize,
}

impl fmt::Display for LayoutAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input array with shape {:?} and strides {:?} is not C-contiguous; \
             copied {} elements before regridding, which will affect performance",
            self.shape, self.strides, self.copied_elements
        )
    }
}

/// Regridded output together with any diagnostics raised while producing it.
#[derive(Debug, Clone)]
pub struct Regridded {
    /// Output array of shape `(*extra_dims, ny_out, nx_out)`.
    pub data: ArrayD<f64>,
    /// Set when the input needed a layout copy.
    pub advisory: Option<LayoutAdvisory>,
}

/// Apply regridding weights to data.
///
/// `data` has shape `(..., ny_in, nx_in)`; the result has shape
/// `(..., ny_out, nx_out)` with the same leading dimensions. Elements of any
/// [`GridValue`] type (floats and integers of every width) are widened to
/// `f64`, the matrix value type. Layout advisories are logged.
///
/// # Errors
///
/// [`RegridError::ShapeMismatch`] when the trailing axes of `data` differ
/// from `shape_in`, or when either grid shape disagrees with the matrix.
pub fn apply_weights<T, S, D>(
    weights: &SparseWeightMatrix,
    data: &ArrayBase<S, D>,
    shape_in: GridShape,
    shape_out: GridShape,
) -> Result<ArrayD<f64>>
where
    T: GridValue,
    S: Data<Elem = T>,
    D: Dimension,
{
    let regridded = apply_weights_with_diagnostics(weights, data, shape_in, shape_out)?;

    if let Some(advisory) = &regridded.advisory {
        warn!(
            shape = ?advisory.shape,
            strides = ?advisory.strides,
            copied_elements = advisory.copied_elements,
            "Input array is not C-contiguous, regridding from a copy"
        );
    }

    Ok(regridded.data)
}

/// Like [`apply_weights`], but returns the layout advisory instead of logging it.
pub fn apply_weights_with_diagnostics<T, S, D>(
    weights: &SparseWeightMatrix,
    data: &ArrayBase<S, D>,
    shape_in: GridShape,
    shape_out: GridShape,
) -> Result<Regridded>
where
    T: GridValue,
    S: Data<Elem = T>,
    D: Dimension,
{
    let data = data.view().into_dyn();
    check_shapes(weights, data.shape(), shape_in, shape_out)?;

    let ndim = data.ndim();
    let extra_dims = data.shape()[..ndim - 2].to_vec();
    let extra_size: usize = extra_dims.iter().product();
    let n_in = shape_in.len();
    let n_out = shape_out.len();

    let advisory = (!data.is_standard_layout()).then(|| LayoutAdvisory {
        shape: data.shape().to_vec(),
        strides: data.strides().to_vec(),
        copied_elements: data.len(),
    });

    // Borrowed as-is when already contiguous.
    let contiguous = data.as_standard_layout();
    let input = contiguous
        .as_slice()
        .ok_or_else(|| RegridError::shape_mismatch("input array could not be flattened"))?;

    let mut output = vec![0.0f64; extra_size * n_out];
    if n_in > 0 && n_out > 0 {
        let csr = weights.csr();
        for (src, dst) in input.chunks_exact(n_in).zip(output.chunks_exact_mut(n_out)) {
            csr.matvec_into(src, dst);
        }
    }

    let mut out_shape = extra_dims;
    out_shape.extend([shape_out.ny, shape_out.nx]);
    let data = ArrayD::from_shape_vec(IxDyn(&out_shape), output)
        .map_err(|e| RegridError::shape_mismatch(format!("cannot build output array: {}", e)))?;

    Ok(Regridded { data, advisory })
}

fn check_shapes(
    weights: &SparseWeightMatrix,
    data_shape: &[usize],
    shape_in: GridShape,
    shape_out: GridShape,
) -> Result<()> {
    let ndim = data_shape.len();
    if ndim < 2 {
        return Err(RegridError::shape_mismatch(format!(
            "input data must have at least 2 dimensions (..., ny, nx), got shape {:?}",
            data_shape
        )));
    }

    let horizontal = (data_shape[ndim - 2], data_shape[ndim - 1]);
    if horizontal != shape_in.as_tuple() {
        return Err(RegridError::shape_mismatch(format!(
            "the horizontal shape of input data is {:?}, different from that of the regridder {}",
            horizontal, shape_in
        )));
    }

    let (n_out, n_in) = weights.shape();
    let cells_in = shape_in.checked_len()?;
    if cells_in != n_in {
        return Err(RegridError::shape_mismatch(format!(
            "ny_in * nx_in = {} * {} = {} should equal weights.shape[1] = {}",
            shape_in.ny, shape_in.nx, cells_in, n_in
        )));
    }
    let cells_out = shape_out.checked_len()?;
    if cells_out != n_out {
        return Err(RegridError::shape_mismatch(format!(
            "ny_out * nx_out = {} * {} = {} should equal weights.shape[0] = {}",
            shape_out.ny, shape_out.nx, cells_out, n_out
        )));
    }

    Ok(())
}
