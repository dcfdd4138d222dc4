//! Error types for voxelization.

use distfield_grid::SampleLocation;
use distfield_math::Vec3;
use distfield_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur while voxelizing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoxelizeError {
    /// Invalid voxelizer settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Grid cells are not cubes.
    #[error("grid cells must be cubic, got cell size {0:?}")]
    NonUniformCells(Vec3),

    /// A bound field samples a different grid than the voxelizer.
    #[error("{0} field does not share the voxelizer's grid")]
    GridMismatch(&'static str),

    /// A bound field stores samples at a different location than the distance field.
    #[error("{field} field is {found:?}-located but the distance field is {expected:?}-located")]
    LocationMismatch {
        /// Which field disagrees.
        field: &'static str,
        /// Location of the distance field.
        expected: SampleLocation,
        /// Location of the offending field.
        found: SampleLocation,
    },

    /// The mesh failed validation.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),

    /// No meshes were given to a one-shot voxelization.
    #[error("no meshes to voxelize")]
    NoMeshes,
}

/// Result type for voxelization.
pub type Result<T> = std::result::Result<T, VoxelizeError>;
