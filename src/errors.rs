//! Centralized error handling for hycom_grid
//!
//! Every stage of an invocation reports failures through [`HycomError`]. A
//! non-200 answer from the grid service is *not* an error: the fetcher reports
//! it as `Ok(false)` and the handler turns it into a 400 reply. Everything
//! else that goes wrong while transforming or publishing surfaces here and is
//! fatal for the invocation.

use std::fmt;

/// Main error type for hycom_grid operations
#[derive(Debug)]
pub enum HycomError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Required variable missing from the downloaded dataset
    VariableNotFound { var: String },

    /// Required dimension missing from the downloaded dataset
    DimensionNotFound { dim: String },

    /// Coordinate vectors and data arrays disagree on an axis length
    ShapeMismatch { message: String },

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Transport-level failure talking to the grid service
    HttpError(reqwest::Error),

    /// Object store rejected or failed the upload
    StorageError(object_store::Error),

    /// Output document could not be serialized
    SerializationError(serde_json::Error),

    /// Missing or invalid configuration value
    ConfigError(String),
}

impl fmt::Display for HycomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HycomError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            HycomError::IoError(e) => write!(f, "I/O error: {}", e),
            HycomError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in dataset", var)
            }
            HycomError::DimensionNotFound { dim } => {
                write!(f, "Dimension '{}' not found in dataset", dim)
            }
            HycomError::ShapeMismatch { message } => write!(f, "Shape mismatch: {}", message),
            HycomError::ArrayError(e) => write!(f, "Array error: {}", e),
            HycomError::HttpError(e) => write!(f, "HTTP error: {}", e),
            HycomError::StorageError(e) => write!(f, "Storage error: {}", e),
            HycomError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            HycomError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for HycomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HycomError::NetCDFError(e) => Some(e),
            HycomError::IoError(e) => Some(e),
            HycomError::ArrayError(e) => Some(e),
            HycomError::HttpError(e) => Some(e),
            HycomError::StorageError(e) => Some(e),
            HycomError::SerializationError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for HycomError {
    fn from(error: netcdf::Error) -> Self {
        HycomError::NetCDFError(error)
    }
}

impl From<std::io::Error> for HycomError {
    fn from(error: std::io::Error) -> Self {
        HycomError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for HycomError {
    fn from(error: ndarray::ShapeError) -> Self {
        HycomError::ArrayError(error)
    }
}

impl From<reqwest::Error> for HycomError {
    fn from(error: reqwest::Error) -> Self {
        HycomError::HttpError(error)
    }
}

impl From<object_store::Error> for HycomError {
    fn from(error: object_store::Error) -> Self {
        HycomError::StorageError(error)
    }
}

impl From<serde_json::Error> for HycomError {
    fn from(error: serde_json::Error) -> Self {
        HycomError::SerializationError(error)
    }
}

/// Result type alias for hycom_grid operations
pub type Result<T> = std::result::Result<T, HycomError>;
