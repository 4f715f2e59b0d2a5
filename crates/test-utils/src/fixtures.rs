//! Common test fixtures.
//!
//! Grid shapes shared across tests, and helpers that write weight tables and
//! grid documents in the JSON layouts the regridder reads.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{ArrayD, IxDyn};
use serde_json::json;

use crate::generators::EsmfTriplet;

/// Standard grid shapes as `(ny, nx)`.
pub mod shapes {
    /// Source grid used with [`COARSE`] for 2x block averaging.
    pub const FINE: (usize, usize) = (4, 6);
    /// Destination grid for 2x block averaging of [`FINE`].
    pub const COARSE: (usize, usize) = (2, 3);
    /// Non-square grid for catching transposed dimensions.
    pub const TALL: (usize, usize) = (5, 3);
}

/// Writes a weight table as `{"variables": {"row", "col", "S"}}` JSON.
pub fn write_weight_json(dir: &Path, name: &str, triplet: &EsmfTriplet) -> PathBuf {
    let doc = json!({
        "variables": {
            "row": triplet.row,
            "col": triplet.col,
            "S": triplet.s,
        },
        "attributes": {
            "title": "test weights",
        }
    });
    write_json(dir, name, &doc)
}

/// Writes an arbitrary JSON value, for malformed-table tests.
pub fn write_json(dir: &Path, name: &str, doc: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, doc.to_string()).expect("Failed to write test JSON");
    path
}

/// Writes a grid as `{"shape": [...], "data": [...]}` JSON.
pub fn write_grid_json(dir: &Path, name: &str, data: &ArrayD<f64>) -> PathBuf {
    let values: Vec<f64> = data.iter().copied().collect();
    let doc = json!({
        "shape": data.shape(),
        "data": values,
    });
    write_json(dir, name, &doc)
}

/// Reads a grid document written by [`write_grid_json`] or the regridder.
///
/// `null` entries are read back as NaN.
pub fn read_grid_json(path: &Path) -> ArrayD<f64> {
    let text = fs::read_to_string(path).expect("Failed to read grid JSON");
    let doc: serde_json::Value = serde_json::from_str(&text).expect("Invalid grid JSON");

    let shape: Vec<usize> = doc["shape"]
        .as_array()
        .expect("grid JSON has no shape")
        .iter()
        .map(|v| v.as_u64().expect("shape entries must be integers") as usize)
        .collect();
    let data: Vec<f64> = doc["data"]
        .as_array()
        .expect("grid JSON has no data")
        .iter()
        .map(|v| v.as_f64().unwrap_or(f64::NAN))
        .collect();

    ArrayD::from_shape_vec(IxDyn(&shape), data).expect("shape does not match data length")
}
