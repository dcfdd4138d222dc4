//! Sampled fields over a [`Grid`].

use std::ops::{Index, IndexMut};

use distfield_math::{Point3, Vec3};
use serde::Serialize;

use crate::grid::{face_neighbors, flat_index, unflatten};
use crate::{Grid, SampleLocation};

/// Per-sample state used while building a distance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Marker {
    /// Not reached; the stored value means "unknown".
    #[default]
    Far,
    /// Queued for a solve.
    Trial,
    /// Written directly from the surface.
    Interface,
    /// Solved by propagation.
    Updated,
}

impl Marker {
    /// Whether the surface or the march reached the sample.
    pub fn is_resolved(self) -> bool {
        matches!(self, Marker::Interface | Marker::Updated)
    }
}

/// A value per sample of a grid, stored row-major with x fastest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field<T> {
    grid: Grid,
    location: SampleLocation,
    dims: [usize; 3],
    data: Vec<T>,
    range: Option<(f64, f64)>,
}

/// Signed distances.
pub type ScalarField = Field<f64>;
/// Velocities.
pub type VectorField = Field<Vec3>;
/// Sample states.
pub type MarkerField = Field<Marker>;

impl<T: Clone> Field<T> {
    /// Create a field with every sample set to `value`.
    pub fn new(grid: Grid, location: SampleLocation, value: T) -> Self {
        let dims = grid.sample_dims(location);
        Self {
            grid,
            location,
            dims,
            data: vec![value; dims.iter().product()],
            range: None,
        }
    }

    /// A field with the same grid and sample location as this one.
    pub fn with_layout_of<U>(other: &Field<U>, value: T) -> Self {
        Self::new(other.grid, other.location, value)
    }

    /// Set every sample to `value` and forget the recorded range.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
        self.range = None;
    }
}

impl<T> Field<T> {
    /// The grid this field samples.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Where samples sit.
    pub fn location(&self) -> SampleLocation {
        self.location
    }

    /// Samples per axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the field has no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `other` has the same grid, location and sample count.
    pub fn same_layout<U>(&self, other: &Field<U>) -> bool {
        self.grid == other.grid && self.location == other.location && self.len() == other.len()
    }

    /// Samples in flat order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable samples in flat order.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Whether `(i, j, k)` is inside the field.
    pub fn contains(&self, ijk: [usize; 3]) -> bool {
        ijk[0] < self.dims[0] && ijk[1] < self.dims[1] && ijk[2] < self.dims[2]
    }

    /// Flat index of `(i, j, k)`.
    pub fn index_of(&self, ijk: [usize; 3]) -> usize {
        flat_index(self.dims, ijk)
    }

    /// Sample coordinates of a flat index.
    pub fn coord_of(&self, idx: usize) -> [usize; 3] {
        unflatten(self.dims, idx)
    }

    /// Sample at `(i, j, k)`, or `None` outside the field.
    pub fn get(&self, ijk: [usize; 3]) -> Option<&T> {
        if self.contains(ijk) {
            self.data.get(self.index_of(ijk))
        } else {
            None
        }
    }

    /// Mutable sample at `(i, j, k)`, or `None` outside the field.
    pub fn get_mut(&mut self, ijk: [usize; 3]) -> Option<&mut T> {
        if self.contains(ijk) {
            let idx = self.index_of(ijk);
            self.data.get_mut(idx)
        } else {
            None
        }
    }

    /// Store `value` at `(i, j, k)`. Returns false outside the field.
    pub fn set(&mut self, ijk: [usize; 3], value: T) -> bool {
        match self.get_mut(ijk) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// The up to six face neighbors of `(i, j, k)` inside the field.
    pub fn neighbors(&self, ijk: [usize; 3]) -> impl Iterator<Item = [usize; 3]> {
        face_neighbors(self.dims, ijk).map(|(_, n)| n)
    }

    /// World position of sample `(i, j, k)`.
    pub fn position(&self, ijk: [usize; 3]) -> Point3 {
        self.grid.sample_position(self.location, ijk)
    }

    /// Recorded `(min, max)` of the values, if any.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    /// Record the value range.
    pub fn set_range(&mut self, range: Option<(f64, f64)>) {
        self.range = range;
    }
}

impl<T> Index<[usize; 3]> for Field<T> {
    type Output = T;

    fn index(&self, ijk: [usize; 3]) -> &T {
        &self.data[flat_index(self.dims, ijk)]
    }
}

impl<T> IndexMut<[usize; 3]> for Field<T> {
    fn index_mut(&mut self, ijk: [usize; 3]) -> &mut T {
        &mut self.data[flat_index(self.dims, ijk)]
    }
}

impl ScalarField {
    /// Recompute the value range over all finite samples.
    pub fn update_range(&mut self) {
        self.range = finite_range(self.data.iter().copied());
    }

    /// Trilinear interpolation at world point `p`.
    ///
    /// Points outside the sample lattice are clamped to it.
    pub fn interpolate(&self, p: &Point3) -> f64 {
        let s = self.grid.to_sample_space(self.location, p);
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for axis in 0..3 {
            let top = (self.dims[axis] - 1) as f64;
            let x = s[axis].clamp(0.0, top);
            let b = x.floor().min((top - 1.0).max(0.0));
            base[axis] = b as usize;
            frac[axis] = x - b;
        }

        let mut value = 0.0;
        for corner in 0..8usize {
            let mut ijk = base;
            let mut weight = 1.0;
            for axis in 0..3 {
                if (corner >> axis) & 1 == 1 {
                    ijk[axis] = (ijk[axis] + 1).min(self.dims[axis] - 1);
                    weight *= frac[axis];
                } else {
                    weight *= 1.0 - frac[axis];
                }
            }
            if weight != 0.0 {
                value += weight * self[ijk];
            }
        }
        value
    }
}

/// `(min, max)` over the finite values of an iterator.
pub fn finite_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
