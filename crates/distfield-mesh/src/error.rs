//! Error types for mesh validation.

use thiserror::Error;

/// Problems found when validating a mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index} of {vertex_count}")]
    IndexOutOfRange {
        /// Triangle index.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Velocity array length differs from the position array length.
    #[error("mesh has {velocities} velocities for {vertices} vertices")]
    VelocityCount {
        /// Number of velocities.
        velocities: usize,
        /// Number of vertices.
        vertices: usize,
    },
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
