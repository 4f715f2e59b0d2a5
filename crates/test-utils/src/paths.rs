//! Locating optional test data and scratch directories.
//!
//! Large ESMF weight files are not committed. Tests that want one look it
//! up with [`find_test_file`] (usually through `require_test_file!`) and
//! skip when it is absent.

use std::path::PathBuf;

/// Environment variable naming an extra directory to search first.
pub const TEST_DATA_DIR_ENV: &str = "TEST_DATA_DIR";

fn workspace_root() -> PathBuf {
    // crates/test-utils -> workspace root
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Find a test data file by name.
///
/// Searches `$TEST_DATA_DIR`, then the `testdata/` directories of
/// `regrid-core`, `netcdf-parser` and the `regridder` service, then
/// `testdata/` at the workspace root.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();

    let env_dir = std::env::var(TEST_DATA_DIR_ENV).ok().map(PathBuf::from);
    let dirs = env_dir.into_iter().chain([
        root.join("crates/regrid-core/testdata"),
        root.join("crates/netcdf-parser/testdata"),
        root.join("services/regridder/testdata"),
        root.join("testdata"),
    ]);

    dirs.map(|dir| dir.join(name)).find(|path| path.exists())
}

/// Create a scratch directory removed when the returned handle drops.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}
