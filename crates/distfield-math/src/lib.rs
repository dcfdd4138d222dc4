#![warn(missing_docs)]

//! Math types for distfield.
//!
//! Thin aliases over nalgebra for points and vectors, tolerance constants,
//! the axis-aligned bounding box shared by the spatial index and the
//! voxelizer, and closest-point / intersection routines on triangles.

pub mod bbox;
pub mod triangle;

pub use bbox::Aabb3;
pub use triangle::{barycentric_2d, closest_point_on_triangle, triangle_normal, TrianglePoint};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Tolerances used when building and querying distance structures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Padding for bounding boxes and barycentric tests, and the smallest
    /// normal component treated as non-zero.
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance of 1e-6.
    pub const DEFAULT: Self = Self { linear: 1e-6 };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
