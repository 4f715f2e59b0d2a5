//! Regridder service library.
//!
//! Exposes the command-line pipeline for testing.

pub mod cli;
pub mod data;
pub mod run;

pub use cli::Args;
pub use data::{read_grid, write_grid, DataFormat, GridDocument};
pub use run::{run, RunSummary};
