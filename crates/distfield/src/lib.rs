#![warn(missing_docs)]

//! distfield: signed distance fields from triangle meshes.
//!
//! Re-exports the workspace crates under one roof and adds [`DistanceField`],
//! an owned bundle of the three sample fields a voxelization produces.
//!
//! # Example
//!
//! ```
//! use distfield::prelude::*;
//!
//! let grid = Grid::from_cell_size([16, 16, 16], Point3::new(-0.8, -0.8, -0.8), 0.1).unwrap();
//! let sphere = make_icosphere(Point3::origin(), 0.5, 2);
//!
//! let field = DistanceField::from_meshes(
//!     grid,
//!     SampleLocation::Cell,
//!     VoxelizeSettings::with_range(0.3),
//!     [&sphere],
//! )
//! .unwrap();
//!
//! assert!(field.report().interface > 0);
//! assert!(field.sample(&Point3::new(0.0, 0.0, 0.45)) < 0.0);
//! ```

use serde::Serialize;
use thiserror::Error;

pub use distfield_bvh as bvh;
pub use distfield_grid as grid;
pub use distfield_math as math;
pub use distfield_mesh as mesh;
pub use distfield_voxel as voxel;

use distfield_grid::{Grid, Marker, MarkerField, SampleLocation, ScalarField, VectorField};
use distfield_math::{Point3, Vec3};
use distfield_mesh::TriangleMesh;
use distfield_voxel::{VoxelFields, VoxelizeReport, VoxelizeSettings, Voxelizer};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::{DistanceField, Error};
    pub use distfield_bvh::{Bvh, BvhParams, ClosestHit};
    pub use distfield_grid::{Grid, Marker, MarkerField, SampleLocation, ScalarField, VectorField};
    pub use distfield_math::{Aabb3, Point3, Tolerance, Vec3};
    pub use distfield_mesh::{make_box, make_icosphere, MeshView, TriangleMesh, TriangleSource};
    pub use distfield_voxel::{
        VoxelFields, VoxelizeReport, VoxelizeSession, VoxelizeSettings, Voxelizer, FAR_DISTANCE,
    };
}

/// Any error raised by the workspace crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid grid description.
    #[error(transparent)]
    Grid(#[from] distfield_grid::GridError),
    /// Invalid mesh.
    #[error(transparent)]
    Mesh(#[from] distfield_mesh::MeshError),
    /// BVH construction failed.
    #[error(transparent)]
    Bvh(#[from] distfield_bvh::BvhError),
    /// Voxelization failed.
    #[error(transparent)]
    Voxelize(#[from] distfield_voxel::VoxelizeError),
}

/// Result alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Distance, marker and velocity fields from one voxelization.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceField {
    distance: ScalarField,
    markers: MarkerField,
    velocity: VectorField,
    report: VoxelizeReport,
}

impl DistanceField {
    /// Allocate fields on `grid` and voxelize `meshes` into them.
    pub fn from_meshes<'m>(
        grid: Grid,
        location: SampleLocation,
        settings: VoxelizeSettings,
        meshes: impl IntoIterator<Item = &'m TriangleMesh>,
    ) -> Result<Self> {
        let voxelizer = Voxelizer::new(grid, settings)?;
        let mut distance = ScalarField::new(grid, location, 0.0);
        let mut markers = MarkerField::new(grid, location, Marker::Far);
        let mut velocity = VectorField::new(grid, location, Vec3::zeros());
        let report = voxelizer.voxelize(
            VoxelFields::new(&mut distance, &mut markers).with_velocity(&mut velocity),
            meshes,
        )?;
        Ok(Self {
            distance,
            markers,
            velocity,
            report,
        })
    }

    /// Signed distances, world units.
    pub fn distance(&self) -> &ScalarField {
        &self.distance
    }

    /// Per-sample state.
    pub fn markers(&self) -> &MarkerField {
        &self.markers
    }

    /// Extrapolated surface velocity.
    pub fn velocity(&self) -> &VectorField {
        &self.velocity
    }

    /// Counters from the voxelization.
    pub fn report(&self) -> &VoxelizeReport {
        &self.report
    }

    /// Grid the fields live on.
    pub fn grid(&self) -> &Grid {
        self.distance.grid()
    }

    /// Trilinear sample of the distance field at `p`.
    ///
    /// Far samples contribute [`FAR_DISTANCE`](distfield_voxel::FAR_DISTANCE),
    /// so results near the band edge are only meaningful in sign.
    pub fn sample(&self, p: &Point3) -> f64 {
        self.distance.interpolate(p)
    }

    /// Split into the owned fields.
    pub fn into_parts(self) -> (ScalarField, MarkerField, VectorField, VoxelizeReport) {
        (self.distance, self.markers, self.velocity, self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_from_meshes_reports_errors() {
        let grid = Grid::new(
            [4, 4, 8],
            Point3::origin(),
            Point3::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        let cube = make_box(Point3::new(0.2, 0.2, 0.2), Point3::new(0.8, 0.8, 0.8));
        let err = DistanceField::from_meshes(
            grid,
            SampleLocation::Cell,
            VoxelizeSettings::default(),
            [&cube],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Voxelize(_)));
    }

    #[test]
    fn test_into_parts_keeps_layout() {
        let grid = Grid::from_cell_size([8, 8, 8], Point3::origin(), 0.25).unwrap();
        let cube = make_box(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5));
        let settings = VoxelizeSettings::default();
        let field =
            DistanceField::from_meshes(grid, SampleLocation::Node, settings, [&cube]).unwrap();
        assert_eq!(field.grid(), &grid);
        let (distance, markers, velocity, report) = field.into_parts();
        assert!(distance.same_layout(&markers));
        assert!(distance.same_layout(&velocity));
        assert_eq!(report.meshes, 1);
    }
}
