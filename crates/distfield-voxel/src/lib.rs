#![warn(missing_docs)]

//! Narrow-band signed distance fields from triangle meshes.
//!
//! Voxelization runs in two passes. Each mesh is first scan-converted:
//! every triangle is intersected with the grid lines it crosses and the few
//! samples around each crossing get their signed distance to the triangle's
//! plane. Those samples are marked [`Marker::Interface`]. [`finalize`] then
//! runs a Fast Marching solve outward from the interface, inside first and
//! outside second, until the wavefront leaves the requested band.
//!
//! Samples the wavefront never reached stay [`Marker::Far`] and hold
//! [`FAR_DISTANCE`]. That value means "unknown", not "far away".
//!
//! # Example
//!
//! ```
//! use distfield_grid::{Grid, Marker, MarkerField, SampleLocation, ScalarField};
//! use distfield_math::Point3;
//! use distfield_mesh::make_box;
//! use distfield_voxel::{VoxelFields, VoxelizeSettings, Voxelizer};
//!
//! let grid = Grid::from_cell_size([20, 20, 20], Point3::new(-1.0, -1.0, -1.0), 0.1).unwrap();
//! let voxelizer = Voxelizer::new(grid, VoxelizeSettings::with_range(0.6)).unwrap();
//!
//! let mut distance = ScalarField::new(grid, SampleLocation::Cell, 0.0);
//! let mut markers = MarkerField::new(grid, SampleLocation::Cell, Marker::Far);
//!
//! let cube = make_box(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
//! let report = voxelizer
//!     .begin(VoxelFields::new(&mut distance, &mut markers))
//!     .and_then(|session| session.add_mesh(&cube))
//!     .map(|session| session.finalize())
//!     .unwrap();
//!
//! assert!(report.interface > 0);
//! assert!(distance[[10, 10, 10]] < 0.0);
//! ```
//!
//! [`finalize`]: VoxelizeSession::finalize
//! [`Marker::Interface`]: distfield_grid::Marker::Interface
//! [`Marker::Far`]: distfield_grid::Marker::Far

mod error;
mod fmm;
mod rasterize;
mod voxelizer;

pub use error::{Result, VoxelizeError};
pub use voxelizer::{Seeded, Unseeded, VoxelFields, VoxelizeSession, Voxelizer};

use distfield_math::Tolerance;
use serde::{Deserialize, Serialize};

/// Stored in samples the wavefront never reached.
///
/// Kept well below `f64::MAX` so scaling by a cell size cannot overflow.
pub const FAR_DISTANCE: f64 = f32::MAX as f64;

/// Relative tolerance used when checking that grid cells are cubes.
pub const UNIFORM_CELL_TOLERANCE: f64 = 1e-6;

/// Parameters for a [`Voxelizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelizeSettings {
    /// Normal components at or below this magnitude are treated as parallel
    /// to the grid lines of that axis. Also pads triangle bounds and
    /// barycentric tests, in cells.
    pub epsilon: f64,
    /// Depth of the band inside the surface, in world units.
    pub neg_range: f64,
    /// Depth of the band outside the surface, in world units.
    pub pos_range: f64,
}

impl Default for VoxelizeSettings {
    fn default() -> Self {
        Self {
            epsilon: Tolerance::DEFAULT.linear,
            neg_range: 1.0,
            pos_range: 1.0,
        }
    }
}

impl VoxelizeSettings {
    /// Settings with the same band depth on both sides.
    pub fn with_range(range: f64) -> Self {
        Self {
            neg_range: range,
            pos_range: range,
            ..Default::default()
        }
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(VoxelizeError::InvalidSettings(
                "epsilon must be finite and non-negative".into(),
            ));
        }
        if !self.neg_range.is_finite() || self.neg_range <= 0.0 {
            return Err(VoxelizeError::InvalidSettings(
                "neg_range must be positive and finite".into(),
            ));
        }
        if !self.pos_range.is_finite() || self.pos_range <= 0.0 {
            return Err(VoxelizeError::InvalidSettings(
                "pos_range must be positive and finite".into(),
            ));
        }
        Ok(())
    }
}

/// Summary of a finished voxelization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelizeReport {
    /// Meshes added to the session.
    pub meshes: usize,
    /// Samples written by scan conversion that hold a distance.
    pub interface: usize,
    /// Samples solved by fast marching that hold a distance.
    pub updated: usize,
    /// Samples holding [`FAR_DISTANCE`], whatever their marker.
    pub far: usize,
    /// Smallest resolved distance, world units.
    pub min: Option<f64>,
    /// Largest resolved distance, world units.
    pub max: Option<f64>,
}

impl VoxelizeReport {
    /// Number of samples holding a distance.
    pub fn resolved(&self) -> usize {
        self.interface + self.updated
    }
}
