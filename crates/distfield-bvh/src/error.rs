//! Error types for BVH construction.

use distfield_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur while building a BVH.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    /// Build parameters are out of range.
    #[error("invalid BVH parameters: {0}")]
    InvalidParams(String),

    /// The triangle source failed validation.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
}

/// Result type for BVH operations.
pub type Result<T> = std::result::Result<T, BvhError>;
