//! A reusable regridder bound to one weight matrix and one pair of grids.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ndarray::{ArrayBase, ArrayD, Data, Dimension};
use tracing::info;

use crate::apply::{apply_weights, apply_weights_with_diagnostics, Regridded};
use crate::cache::WeightCache;
use crate::config::RegridConfig;
use crate::error::{RegridError, Result};
use crate::nan_fill::add_nans_to_weights;
use crate::sparse::SparseWeightMatrix;
use crate::types::{GridShape, GridValue};
use crate::weights::{read_weights, WeightSource};

/// Regrids arrays from one grid to another with precomputed weights.
#[derive(Debug, Clone)]
pub struct Regridder {
    weights: Arc<SparseWeightMatrix>,
    shape_in: GridShape,
    shape_out: GridShape,
    unmapped_to_nan: bool,
    n_unmapped: usize,
}

impl Regridder {
    /// Load weights from `source` for the given grids.
    ///
    /// With `unmapped_to_nan`, destination cells that receive no weight come
    /// out as NaN instead of 0.
    pub fn new(
        source: impl Into<WeightSource>,
        shape_in: GridShape,
        shape_out: GridShape,
        unmapped_to_nan: bool,
    ) -> Result<Self> {
        let weights = read_weights(source, shape_in.checked_len()?, shape_out.checked_len()?)?;
        Self::from_weights(Arc::new(weights), shape_in, shape_out, unmapped_to_nan)
    }

    /// Load weights through a [`WeightCache`], sharing matrices between regridders.
    pub fn from_cache(
        cache: &mut WeightCache,
        path: &Path,
        shape_in: GridShape,
        shape_out: GridShape,
        unmapped_to_nan: bool,
    ) -> Result<Self> {
        let weights = cache.get_or_load(path, shape_in.checked_len()?, shape_out.checked_len()?)?;
        Self::from_weights(weights, shape_in, shape_out, unmapped_to_nan)
    }

    /// Build from a validated configuration, with a weight cache sized by
    /// `weight_cache_entries`.
    pub fn from_config(config: &RegridConfig) -> Result<Self> {
        let mut cache = WeightCache::from_config(config);
        Self::from_config_with_cache(config, &mut cache)
    }

    /// Build from a validated configuration, loading weights through `cache`.
    pub fn from_config_with_cache(config: &RegridConfig, cache: &mut WeightCache) -> Result<Self> {
        config.validate()?;

        match (&config.weights_path, config.shape_in, config.shape_out) {
            (Some(path), Some(shape_in), Some(shape_out)) => {
                Self::from_cache(cache, path, shape_in, shape_out, config.unmapped_to_nan)
            }
            _ => Err(RegridError::config("weights_path, shape_in and shape_out must be set")),
        }
    }

    /// Wrap an existing matrix, checking it against the grids.
    pub fn from_weights(
        weights: Arc<SparseWeightMatrix>,
        shape_in: GridShape,
        shape_out: GridShape,
        unmapped_to_nan: bool,
    ) -> Result<Self> {
        let expected = (shape_out.checked_len()?, shape_in.checked_len()?);
        if weights.shape() != expected {
            return Err(RegridError::shape_mismatch(format!(
                "weights have shape {:?} but grids {} -> {} need {:?}",
                weights.shape(),
                shape_in,
                shape_out,
                expected
            )));
        }

        let n_unmapped = weights.empty_rows().len();
        let weights = if unmapped_to_nan && n_unmapped > 0 {
            Arc::new(add_nans_to_weights(&weights))
        } else {
            weights
        };

        info!(
            shape_in = %shape_in,
            shape_out = %shape_out,
            nnz = weights.nnz(),
            n_unmapped,
            unmapped_to_nan,
            "Created regridder"
        );

        Ok(Self {
            weights,
            shape_in,
            shape_out,
            unmapped_to_nan,
            n_unmapped,
        })
    }

    /// Regrid `data` of shape `(..., ny_in, nx_in)`.
    pub fn regrid<T, S, D>(&self, data: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
    where
        T: GridValue,
        S: Data<Elem = T>,
        D: Dimension,
    {
        apply_weights(&self.weights, data, self.shape_in, self.shape_out)
    }

    /// Regrid and return the layout advisory instead of logging it.
    pub fn regrid_with_diagnostics<T, S, D>(&self, data: &ArrayBase<S, D>) -> Result<Regridded>
    where
        T: GridValue,
        S: Data<Elem = T>,
        D: Dimension,
    {
        apply_weights_with_diagnostics(&self.weights, data, self.shape_in, self.shape_out)
    }

    /// The weight matrix in use (NaN-filled if requested).
    pub fn weights(&self) -> &Arc<SparseWeightMatrix> {
        &self.weights
    }

    /// Source grid shape.
    pub fn shape_in(&self) -> GridShape {
        self.shape_in
    }

    /// Destination grid shape.
    pub fn shape_out(&self) -> GridShape {
        self.shape_out
    }

    /// Whether unmapped cells regrid to NaN.
    pub fn unmapped_to_nan(&self) -> bool {
        self.unmapped_to_nan
    }

    /// Number of destination cells the loaded weights leave unmapped.
    pub fn n_unmapped(&self) -> usize {
        self.n_unmapped
    }
}

impl fmt::Display for Regridder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Regridder")?;
        writeln!(f, "  input grid shape:  {}", self.shape_in)?;
        writeln!(f, "  output grid shape: {}", self.shape_out)?;
        writeln!(f, "  weight entries:    {}", self.weights.nnz())?;
        writeln!(f, "  unmapped cells:    {}", self.n_unmapped)?;
        write!(f, "  unmapped to NaN:   {}", self.unmapped_to_nan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::WeightTable;
    use ndarray::{arr2, Array3};

    /// 2x2 -> 1x2: left column averaged, right column unmapped.
    fn half_mapped() -> WeightTable {
        WeightTable::esmf(vec![1, 1], vec![1, 3], vec![0.5, 0.5])
    }

    #[test]
    fn test_regrid_with_zero_for_unmapped() {
        let regridder =
            Regridder::new(half_mapped(), GridShape::new(2, 2), GridShape::new(1, 2), false).unwrap();
        assert_eq!(regridder.n_unmapped(), 1);

        let out = regridder.regrid(&arr2(&[[1.0, 2.0], [3.0, 4.0]])).unwrap();
        assert_eq!(out.shape(), &[1, 2]);
        assert_eq!(out[[0, 0]], 2.0);
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn test_regrid_with_nan_for_unmapped() {
        let regridder =
            Regridder::new(half_mapped(), GridShape::new(2, 2), GridShape::new(1, 2), true).unwrap();

        let data = Array3::from_elem((3, 2, 2), 7.0f32);
        let out = regridder.regrid(&data).unwrap();
        assert_eq!(out.shape(), &[3, 1, 2]);
        for t in 0..3 {
            assert_eq!(out[[t, 0, 0]], 7.0);
            assert!(out[[t, 0, 1]].is_nan());
        }
        assert!(regridder.weights().empty_rows().is_empty());
    }

    #[test]
    fn test_wrong_matrix_shape_rejected() {
        let err = Regridder::from_weights(
            Arc::new(SparseWeightMatrix::identity(4)),
            GridShape::new(2, 2),
            GridShape::new(3, 3),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RegridError::ShapeMismatch(_)));
    }

    #[test]
    fn test_from_config_requires_paths() {
        assert!(matches!(
            Regridder::from_config(&RegridConfig::default()),
            Err(RegridError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_shares_cached_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(
            &path,
            r#"{"variables": {"row": [1, 1], "col": [1, 3], "S": [0.5, 0.5]}}"#,
        )
        .unwrap();

        let config = RegridConfig {
            weights_path: Some(path),
            shape_in: Some(GridShape::new(2, 2)),
            shape_out: Some(GridShape::new(1, 2)),
            weight_cache_entries: 2,
            ..Default::default()
        };

        let mut cache = WeightCache::from_config(&config);
        assert_eq!(cache.capacity(), 2);

        let a = Regridder::from_config_with_cache(&config, &mut cache).unwrap();
        let b = Regridder::from_config_with_cache(&config, &mut cache).unwrap();
        assert!(Arc::ptr_eq(a.weights(), b.weights()));
        assert_eq!(cache.stats().hits, 1);

        let fresh = Regridder::from_config(&config).unwrap();
        assert_eq!(fresh.weights().as_ref(), a.weights().as_ref());
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let err = Regridder::from_weights(
            Arc::new(SparseWeightMatrix::identity(4)),
            GridShape::new(2, 2),
            GridShape::new(usize::MAX, 2),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RegridError::Config(_)));
    }

    #[test]
    fn test_display_summary() {
        let regridder =
            Regridder::new(half_mapped(), GridShape::new(2, 2), GridShape::new(1, 2), true).unwrap();
        let summary = regridder.to_string();
        assert!(summary.contains("input grid shape:  (2, 2)"));
        assert!(summary.contains("unmapped cells:    1"));
    }
}
