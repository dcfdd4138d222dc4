//! Error types for grid construction.

use thiserror::Error;

/// Errors from grid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// A resolution component is zero.
    #[error("invalid grid resolution {0:?}: every axis needs at least one cell")]
    InvalidResolution([usize; 3]),

    /// Bounds are inverted, flat or not finite.
    #[error("invalid grid extent: {0}")]
    InvalidExtent(String),

    /// Cell size is not positive and finite.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f64),
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
