#![warn(missing_docs)]

//! Bounding volume hierarchy over triangle meshes.
//!
//! [`Bvh`] answers two questions about a mesh: which triangle is closest to
//! a point, and which triangles may overlap a box. It works on anything that
//! implements [`TriangleSource`](distfield_mesh::TriangleSource), so owned
//! meshes, borrowed meshes and raw point/index arrays share one tree type.
//!
//! # Example
//!
//! ```
//! use distfield_bvh::{Bvh, BvhParams};
//! use distfield_math::Point3;
//! use distfield_mesh::make_box;
//!
//! let cube = make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
//! let bvh = Bvh::build(cube, &BvhParams::default()).unwrap();
//!
//! let hit = bvh.closest_point(&Point3::new(0.5, 0.5, 3.0), f64::INFINITY).unwrap();
//! assert!((hit.distance - 2.0).abs() < 1e-12);
//! ```

mod bvh;
mod error;
mod query;

pub use bvh::{Bvh, BvhCell};
pub use error::{BvhError, Result};
pub use query::ClosestHit;

use distfield_math::Tolerance;
use serde::{Deserialize, Serialize};

/// Deepest subdivision level accepted by [`BvhParams::validate`].
pub const MAX_SUPPORTED_LEVEL: u32 = 32;

/// Parameters controlling BVH subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhParams {
    /// Cells at this level are never split.
    pub max_level: u32,
    /// Cells holding at most this many triangles are never split.
    pub max_leaf_triangles: usize,
    /// Padding applied to each triangle's bounding box.
    pub epsilon: f64,
}

impl Default for BvhParams {
    fn default() -> Self {
        Self {
            max_level: 10,
            max_leaf_triangles: 10,
            epsilon: Tolerance::DEFAULT.linear,
        }
    }
}

impl BvhParams {
    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        if self.max_level > MAX_SUPPORTED_LEVEL {
            return Err(BvhError::InvalidParams(format!(
                "max_level must be at most {MAX_SUPPORTED_LEVEL}"
            )));
        }
        if self.max_leaf_triangles == 0 {
            return Err(BvhError::InvalidParams(
                "max_leaf_triangles must be at least 1".into(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(BvhError::InvalidParams(
                "epsilon must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }
}
