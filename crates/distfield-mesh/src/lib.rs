#![warn(missing_docs)]

//! Triangle mesh inputs for distfield.
//!
//! Distance queries only need to ask a mesh for the corners of its
//! triangles. [`TriangleSource`] captures that, and is implemented both for
//! the owning [`TriangleMesh`] and for [`MeshView`], a borrowed pair of raw
//! point / index arrays.

mod error;
pub mod primitives;

pub use error::{MeshError, Result};
pub use primitives::{make_box, make_icosphere};

use distfield_math::{Aabb3, Point3, Vec3};
use serde::{Deserialize, Serialize};

/// Read access to the triangles of a mesh.
pub trait TriangleSource {
    /// Number of triangles.
    fn triangle_count(&self) -> usize;

    /// Position of corner `corner` (0, 1 or 2) of triangle `tri`.
    fn vertex(&self, tri: usize, corner: usize) -> Point3;

    /// The three corners of triangle `tri`.
    fn triangle(&self, tri: usize) -> [Point3; 3] {
        [self.vertex(tri, 0), self.vertex(tri, 1), self.vertex(tri, 2)]
    }

    /// Bounding box of the mesh. Empty if there is nothing to bound.
    fn bounds(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for tri in 0..self.triangle_count() {
            for corner in 0..3 {
                aabb.expand_point(&self.vertex(tri, corner));
            }
        }
        aabb
    }

    /// Check that every triangle can be read without going out of bounds.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: TriangleSource + ?Sized> TriangleSource for &T {
    fn triangle_count(&self) -> usize {
        (**self).triangle_count()
    }

    fn vertex(&self, tri: usize, corner: usize) -> Point3 {
        (**self).vertex(tri, corner)
    }

    fn bounds(&self) -> Aabb3 {
        (**self).bounds()
    }

    fn validate(&self) -> Result<()> {
        (**self).validate()
    }
}

/// Check a triangle index list against a vertex count.
fn check_indices(triangles: &[[u32; 3]], vertex_count: usize) -> Result<()> {
    for (tri, idx) in triangles.iter().enumerate() {
        if let Some(&bad) = idx.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                triangle: tri,
                index: bad,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// Owning triangle mesh with optional per-vertex velocities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Counter-clockwise (outward-facing) vertex index triples.
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex velocities, same length as `positions` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocities: Option<Vec<Vec3>>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from positions and triangles, without velocities.
    pub fn from_parts(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            velocities: None,
        }
    }

    /// Attach per-vertex velocities.
    pub fn with_velocities(mut self, velocities: Vec<Vec3>) -> Self {
        self.velocities = Some(velocities);
        self
    }

    /// Give every vertex the same velocity.
    pub fn with_uniform_velocity(self, velocity: Vec3) -> Self {
        let n = self.positions.len();
        self.with_velocities(vec![velocity; n])
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Velocity of vertex `v`, zero if the mesh carries none.
    pub fn vertex_velocity(&self, v: usize) -> Vec3 {
        self.velocities
            .as_ref()
            .and_then(|vel| vel.get(v).copied())
            .unwrap_or_else(Vec3::zeros)
    }

    /// Borrow the raw arrays as a [`MeshView`].
    pub fn view(&self) -> MeshView<'_> {
        MeshView::new(&self.positions, &self.triangles)
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Merge another mesh into this one.
    ///
    /// Velocities are kept if either mesh has them; the side without
    /// velocities contributes zeros.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        let merged_velocities = match (&self.velocities, &other.velocities) {
            (None, None) => None,
            _ => {
                let mut v: Vec<Vec3> = (0..self.num_vertices())
                    .map(|i| self.vertex_velocity(i))
                    .collect();
                v.extend((0..other.num_vertices()).map(|i| other.vertex_velocity(i)));
                Some(v)
            }
        };
        self.positions.extend_from_slice(&other.positions);
        self.triangles
            .extend(other.triangles.iter().map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]));
        self.velocities = merged_velocities;
    }
}

impl TriangleSource for TriangleMesh {
    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn vertex(&self, tri: usize, corner: usize) -> Point3 {
        self.positions[self.triangles[tri][corner] as usize]
    }

    /// Union of all vertex positions, referenced or not.
    fn bounds(&self) -> Aabb3 {
        Aabb3::from_points(&self.positions)
    }

    fn validate(&self) -> Result<()> {
        check_indices(&self.triangles, self.positions.len())?;
        if let Some(vel) = &self.velocities {
            if vel.len() != self.positions.len() {
                return Err(MeshError::VelocityCount {
                    velocities: vel.len(),
                    vertices: self.positions.len(),
                });
            }
        }
        Ok(())
    }
}

/// Borrowed point and triangle arrays.
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    /// Vertex positions.
    pub points: &'a [Point3],
    /// Vertex index triples.
    pub triangles: &'a [[u32; 3]],
}

impl<'a> MeshView<'a> {
    /// Wrap raw arrays.
    pub fn new(points: &'a [Point3], triangles: &'a [[u32; 3]]) -> Self {
        Self { points, triangles }
    }
}

impl TriangleSource for MeshView<'_> {
    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn vertex(&self, tri: usize, corner: usize) -> Point3 {
        self.points[self.triangles[tri][corner] as usize]
    }

    fn bounds(&self) -> Aabb3 {
        Aabb3::from_points(self.points)
    }

    fn validate(&self) -> Result<()> {
        check_indices(self.triangles, self.points.len())
    }
}
