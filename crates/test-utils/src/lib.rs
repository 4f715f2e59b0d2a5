//! Test helpers shared by the regridding crates.
//!
//! - [`paths`]: optional test data lookup and scratch directories
//! - [`generators`]: ramp grids and 1-based ESMF weight triplets
//! - [`fixtures`]: weight tables and grid documents written as JSON
//!
//! Pull it in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a test data file or return early from the test.
///
/// ```ignore
/// #[test]
/// fn test_esmf_bilinear_weights() {
///     let path = test_utils::require_test_file!("bilinear_4x5_2x2.nc");
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: '{}' not found; set {} to a directory containing it",
                    $name,
                    $crate::TEST_DATA_DIR_ENV
                );
                return;
            }
        }
    }};
}

/// Assert two numbers are within `epsilon` of each other, compared as `f64`.
///
/// ```ignore
/// assert_approx_eq!(out[[0, 0]], 500.5, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert two `f64` slices match element-wise within `epsilon`.
///
/// NaN matches NaN, so outputs with unmapped cells compare directly.
///
/// ```ignore
/// assert_slice_approx_eq!(out.as_slice().unwrap(), [1.0, f64::NAN], 1e-12);
/// ```
#[macro_export]
macro_rules! assert_slice_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = &$left[..];
        let right: &[f64] = &$right[..];
        assert_eq!(
            left.len(),
            right.len(),
            "assertion failed: slices differ in length"
        );
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            if l.is_nan() && r.is_nan() {
                continue;
            }
            let diff = (l - r).abs();
            if !(diff <= $epsilon as f64) {
                panic!(
                    "assertion failed: slices differ at index {}\n  left: `{:?}`,\n right: `{:?}`",
                    i, l, r
                );
            }
        }
    }};
}
