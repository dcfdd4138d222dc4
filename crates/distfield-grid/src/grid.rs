//! Regular grid descriptor.

use distfield_math::{Aabb3, Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// Where a field stores its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleLocation {
    /// Grid corners: `n + 1` samples per axis at `min + i * dx`.
    Node,
    /// Cell centers: `n` samples per axis at `min + (i + 0.5) * dx`.
    #[default]
    Cell,
}

impl SampleLocation {
    /// Offset of sample 0 from `min`, in cells.
    pub fn offset(self) -> f64 {
        match self {
            SampleLocation::Node => 0.0,
            SampleLocation::Cell => 0.5,
        }
    }
}

/// An axis-aligned box divided into `nx * ny * nz` cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Grid {
    resolution: [usize; 3],
    min: Point3,
    max: Point3,
    cell_size: Vec3,
}

impl Grid {
    /// Create a grid spanning `min` to `max`.
    pub fn new(resolution: [usize; 3], min: Point3, max: Point3) -> Result<Self> {
        if resolution.iter().any(|&n| n == 0) {
            return Err(GridError::InvalidResolution(resolution));
        }
        for axis in 0..3 {
            if !min[axis].is_finite() || !max[axis].is_finite() {
                return Err(GridError::InvalidExtent("bounds must be finite".into()));
            }
            if max[axis] <= min[axis] {
                return Err(GridError::InvalidExtent(format!(
                    "max must exceed min on axis {axis} ({} <= {})",
                    max[axis], min[axis]
                )));
            }
        }

        let extent = max - min;
        let cell_size = Vec3::new(
            extent.x / resolution[0] as f64,
            extent.y / resolution[1] as f64,
            extent.z / resolution[2] as f64,
        );

        Ok(Self {
            resolution,
            min,
            max,
            cell_size,
        })
    }

    /// Create a grid of cubic cells of edge `h` starting at `min`.
    pub fn from_cell_size(resolution: [usize; 3], min: Point3, h: f64) -> Result<Self> {
        if !h.is_finite() || h <= 0.0 {
            return Err(GridError::InvalidCellSize(h));
        }
        let max = Point3::new(
            min.x + resolution[0] as f64 * h,
            min.y + resolution[1] as f64 * h,
            min.z + resolution[2] as f64 * h,
        );
        Self::new(resolution, min, max)
    }

    /// Number of cells per axis.
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Lower corner.
    pub fn min(&self) -> Point3 {
        self.min
    }

    /// Upper corner.
    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Grid extent as a box.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::new(self.min, self.max)
    }

    /// Cell edge lengths.
    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// The cell edge length if cells are cubes to within relative tolerance `tol`.
    pub fn uniform_cell_size(&self, tol: f64) -> Option<f64> {
        let h = self.cell_size;
        let lo = h.x.min(h.y).min(h.z);
        let hi = h.x.max(h.y).max(h.z);
        if hi - lo <= tol * hi {
            Some(h.x)
        } else {
            None
        }
    }

    /// Samples per axis for `location`.
    pub fn sample_dims(&self, location: SampleLocation) -> [usize; 3] {
        let extra = match location {
            SampleLocation::Node => 1,
            SampleLocation::Cell => 0,
        };
        self.resolution.map(|n| n + extra)
    }

    /// Total number of samples for `location`.
    pub fn sample_count(&self, location: SampleLocation) -> usize {
        self.sample_dims(location).iter().product()
    }

    /// Row-major flat index of sample `(i, j, k)`, x fastest.
    pub fn flat_index(&self, location: SampleLocation, ijk: [usize; 3]) -> usize {
        flat_index(self.sample_dims(location), ijk)
    }

    /// World position of sample `(i, j, k)`.
    pub fn sample_position(&self, location: SampleLocation, ijk: [usize; 3]) -> Point3 {
        let off = location.offset();
        Point3::new(
            self.min.x + (ijk[0] as f64 + off) * self.cell_size.x,
            self.min.y + (ijk[1] as f64 + off) * self.cell_size.y,
            self.min.z + (ijk[2] as f64 + off) * self.cell_size.z,
        )
    }

    /// Map a world point into sample-index space, where sample `(i, j, k)`
    /// sits at the integer point `(i, j, k)`.
    pub fn to_sample_space(&self, location: SampleLocation, p: &Point3) -> Point3 {
        let off = location.offset();
        Point3::new(
            (p.x - self.min.x) / self.cell_size.x - off,
            (p.y - self.min.y) / self.cell_size.y - off,
            (p.z - self.min.z) / self.cell_size.z - off,
        )
    }

    /// Inverse of [`to_sample_space`](Self::to_sample_space).
    pub fn from_sample_space(&self, location: SampleLocation, s: &Point3) -> Point3 {
        let off = location.offset();
        Point3::new(
            self.min.x + (s.x + off) * self.cell_size.x,
            self.min.y + (s.y + off) * self.cell_size.y,
            self.min.z + (s.z + off) * self.cell_size.z,
        )
    }
}

/// Row-major flat index into a block of `dims` samples.
pub fn flat_index(dims: [usize; 3], ijk: [usize; 3]) -> usize {
    ijk[0] + dims[0] * (ijk[1] + dims[1] * ijk[2])
}

/// Inverse of [`flat_index`].
pub fn unflatten(dims: [usize; 3], idx: usize) -> [usize; 3] {
    let i = idx % dims[0];
    let rest = idx / dims[0];
    [i, rest % dims[1], rest / dims[1]]
}

/// Face neighbors of `(i, j, k)` inside a block of `dims` samples, each
/// paired with the axis it differs along.
pub fn face_neighbors(
    dims: [usize; 3],
    ijk: [usize; 3],
) -> impl Iterator<Item = (usize, [usize; 3])> {
    (0..3).flat_map(move |axis| {
        let lower = (ijk[axis] > 0).then(|| {
            let mut n = ijk;
            n[axis] -= 1;
            (axis, n)
        });
        let upper = (ijk[axis] + 1 < dims[axis]).then(|| {
            let mut n = ijk;
            n[axis] += 1;
            (axis, n)
        });
        lower.into_iter().chain(upper)
    })
}
