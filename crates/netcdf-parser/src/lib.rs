//! NetCDF access for regridding.
//!
//! This crate reads the variables of ESMF weight files (`row`, `col`, `S`)
//! and gridded data variables, and writes regridded arrays back out.
//!
//! # Implementation Notes
//!
//! Uses the `netcdf` crate, which links against libnetcdf and HDF5.
//! System requirements: `libhdf5-dev libnetcdf-dev`.
//!
//! # ESMF Weight File Structure
//!
//! ESMF_RegridWeightGen writes the sparse matrix as three co-indexed
//! variables along the `n_s` dimension: `row` (1-based destination index),
//! `col` (1-based source index) and `S` (weight). Index variables are
//! integers; some tools store them as doubles.

pub mod error;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{read_array, read_variables, silence_hdf5_errors, write_array, NcTable, NcValues};
