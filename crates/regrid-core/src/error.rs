//! Error types for regridding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading weights or regridding data.
#[derive(Error, Debug)]
pub enum RegridError {
    /// A weight or data file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A weight source lacks one or more required fields.
    #[error("{source_kind} is missing required fields: {}", missing.join(", "))]
    Schema {
        source_kind: String,
        missing: Vec<String>,
    },

    /// Grid shapes disagree with the matrix or with the input array.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Weight indices are structurally invalid (negative, fractional, out of range,
    /// or in columns of unequal length).
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// The weight file format is not recognized or not compiled in.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The weight file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegridError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a Schema error listing the missing field names.
    pub fn schema<I, S>(source_kind: impl Into<String>, missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Schema {
            source_kind: source_kind.into(),
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an InvalidWeights error.
    pub fn invalid_weights(msg: impl Into<String>) -> Self {
        Self::InvalidWeights(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The missing field names if this is a schema error.
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            Self::Schema { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RegridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for RegridError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(feature = "netcdf")]
impl From<netcdf_parser::NetCdfError> for RegridError {
    fn from(err: netcdf_parser::NetCdfError) -> Self {
        use netcdf_parser::NetCdfError;

        match err {
            NetCdfError::IoError(e) => Self::Io(e),
            NetCdfError::NotFound(path) => Self::NotFound { path },
            other => Self::Parse(other.to_string()),
        }
    }
}

/// Result type for regridding operations.
pub type Result<T> = std::result::Result<T, RegridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message_names_fields() {
        let err = RegridError::schema("weights dataset", ["row", "S"]);
        let msg = err.to_string();
        assert!(msg.contains("weights dataset"));
        assert!(msg.contains("row, S"));
        assert_eq!(err.missing_fields().unwrap(), &["row", "S"]);
    }

    #[test]
    fn test_not_found_message_includes_path() {
        let err = RegridError::not_found("/no/such/weights.nc");
        assert_eq!(err.to_string(), "file not found: /no/such/weights.nc");
        assert!(err.missing_fields().is_none());
    }
}
