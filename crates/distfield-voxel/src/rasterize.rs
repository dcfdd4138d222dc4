//! Scan conversion of triangles onto grid lines.
//!
//! Works in sample-index space, where sample `(i, j, k)` sits at the integer
//! point `(i, j, k)`. For each axis the triangle is not parallel to, every
//! grid line along that axis that pierces the triangle seeds the four
//! samples around the crossing with their signed offset to the triangle's
//! plane.

use std::ops::RangeInclusive;

use distfield_grid::{Grid, Marker};
use distfield_math::{barycentric_2d, triangle_normal, Aabb3, Point3};
use distfield_mesh::{TriangleMesh, TriangleSource};
use tracing::trace;

use crate::VoxelFields;

/// Counters from one mesh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RasterStats {
    /// Degenerate triangles that were skipped.
    pub skipped: usize,
    /// Grid lines that pierced a triangle.
    pub lines: usize,
    /// Sample writes that improved the stored value.
    pub writes: usize,
}

/// Samples seeded on each side of a crossing, relative to `floor(hit)`.
const WINDOW: RangeInclusive<i64> = -1..=2;

pub(crate) fn rasterize_mesh(
    grid: &Grid,
    epsilon: f64,
    fields: &mut VoxelFields<'_>,
    mesh: &TriangleMesh,
) -> RasterStats {
    let location = fields.distance.location();
    let dims = fields.distance.dims();
    let mut stats = RasterStats::default();

    for (tri, &indices) in mesh.triangles.iter().enumerate() {
        let [a, b, c] = mesh.triangle(tri);
        let Some(normal) = triangle_normal(&a, &b, &c) else {
            trace!(triangle = tri, "skipping degenerate triangle");
            stats.skipped += 1;
            continue;
        };

        let s = [
            grid.to_sample_space(location, &a),
            grid.to_sample_space(location, &b),
            grid.to_sample_space(location, &c),
        ];
        let velocities = indices.map(|v| mesh.vertex_velocity(v as usize));
        let mut bounds = Aabb3::from_triangle(&s[0], &s[1], &s[2]);
        bounds.pad(epsilon);

        for axis in 0..3 {
            let n = normal[axis];
            if n.abs() <= epsilon {
                trace!(triangle = tri, axis, "triangle parallel to grid lines");
                continue;
            }

            let u = (axis + 1) % 3;
            let v = (axis + 2) % 3;
            let (Some(us), Some(vs)) = (
                line_range(bounds.min[u], bounds.max[u], dims[u]),
                line_range(bounds.min[v], bounds.max[v], dims[v]),
            ) else {
                continue;
            };
            let project = |p: &Point3| [p[u], p[v]];
            let (pa, pb, pc) = (project(&s[0]), project(&s[1]), project(&s[2]));

            for iv in vs {
                for iu in us.clone() {
                    let Some(bary) = barycentric_2d([iu as f64, iv as f64], pa, pb, pc) else {
                        continue;
                    };
                    if bary.iter().any(|&w| w < -epsilon) {
                        continue;
                    }
                    stats.lines += 1;

                    let hit = bary[0] * s[0][axis] + bary[1] * s[1][axis] + bary[2] * s[2][axis];
                    let velocity =
                        velocities[0] * bary[0] + velocities[1] * bary[1] + velocities[2] * bary[2];

                    let base = hit.floor() as i64;
                    for offset in WINDOW {
                        let sample = base + offset;
                        if sample < 0 || sample >= dims[axis] as i64 {
                            continue;
                        }
                        let mut ijk = [0usize; 3];
                        ijk[axis] = sample as usize;
                        ijk[u] = iu;
                        ijk[v] = iv;

                        let value = (sample as f64 - hit) * n;
                        let slot = &mut fields.distance[ijk];
                        if value.abs() < slot.abs() {
                            *slot = value;
                            fields.markers[ijk] = Marker::Interface;
                            if let Some(field) = fields.velocity.as_deref_mut() {
                                field[ijk] = velocity;
                            }
                            stats.writes += 1;
                        }
                    }
                }
            }
        }
    }

    stats
}

/// Integer grid lines in `[lo, hi]`, clamped to `0..count`.
fn line_range(lo: f64, hi: f64, count: usize) -> Option<RangeInclusive<usize>> {
    let first = lo.ceil().max(0.0);
    let last = hi.floor().min(count as f64 - 1.0);
    (first <= last).then(|| first as usize..=last as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FAR_DISTANCE;
    use distfield_grid::{MarkerField, SampleLocation, ScalarField, VectorField};
    use distfield_math::Vec3;

    fn grid() -> Grid {
        Grid::from_cell_size([8, 8, 8], Point3::origin(), 1.0).unwrap()
    }

    /// A single upward-facing square at height `z`, covering x, y in [1, 6].
    fn square(z: f64) -> TriangleMesh {
        TriangleMesh::from_parts(
            vec![
                Point3::new(1.0, 1.0, z),
                Point3::new(6.0, 1.0, z),
                Point3::new(6.0, 6.0, z),
                Point3::new(1.0, 6.0, z),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_line_range() {
        assert_eq!(line_range(0.2, 3.7, 10), Some(1..=3));
        assert_eq!(line_range(-5.0, 1.0, 10), Some(0..=1));
        assert_eq!(line_range(8.5, 20.0, 10), Some(9..=9));
        assert_eq!(line_range(0.2, 0.8, 10), None);
        assert_eq!(line_range(12.0, 14.0, 10), None);
    }

    #[test]
    fn test_plane_seeds_four_samples() {
        let grid = grid();
        let mut distance = ScalarField::new(grid, SampleLocation::Node, FAR_DISTANCE);
        let mut markers = MarkerField::new(grid, SampleLocation::Node, Marker::Far);
        let mut fields = VoxelFields::new(&mut distance, &mut markers);

        let stats = rasterize_mesh(&grid, 1e-6, &mut fields, &square(3.25));
        assert_eq!(stats.skipped, 0);
        // Lines on x, y in 1..=6, some shared by both triangles
        assert!(stats.lines >= 36);

        for k in 0..9 {
            let m = markers[[3, 3, k]];
            if (2..=5).contains(&k) {
                assert_eq!(m, Marker::Interface, "k = {k}");
                assert!((distance[[3, 3, k]] - (k as f64 - 3.25)).abs() < 1e-12);
            } else {
                assert_eq!(m, Marker::Far, "k = {k}");
            }
        }
        // Outside the square's footprint nothing is touched
        assert_eq!(markers[[7, 7, 3]], Marker::Far);
    }

    #[test]
    fn test_sign_follows_normal() {
        let grid = grid();
        let mut distance = ScalarField::new(grid, SampleLocation::Node, FAR_DISTANCE);
        let mut markers = MarkerField::new(grid, SampleLocation::Node, Marker::Far);
        let mut fields = VoxelFields::new(&mut distance, &mut markers);

        // Flip the winding so the square faces down
        let mut mesh = square(3.25);
        for t in &mut mesh.triangles {
            t.swap(1, 2);
        }
        rasterize_mesh(&grid, 1e-6, &mut fields, &mesh);
        assert!(distance[[3, 3, 4]] < 0.0);
        assert!(distance[[3, 3, 3]] > 0.0);
    }

    #[test]
    fn test_closer_surface_wins() {
        let grid = grid();
        let mut distance = ScalarField::new(grid, SampleLocation::Node, FAR_DISTANCE);
        let mut markers = MarkerField::new(grid, SampleLocation::Node, Marker::Far);
        let mut fields = VoxelFields::new(&mut distance, &mut markers);

        rasterize_mesh(&grid, 1e-6, &mut fields, &square(3.5));
        let stats = rasterize_mesh(&grid, 1e-6, &mut fields, &square(3.9));
        assert!(stats.writes > 0);
        assert!((distance[[3, 3, 4]] - 0.1).abs() < 1e-12);
        assert!((distance[[3, 3, 3]] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_is_interpolated() {
        let grid = grid();
        let mut distance = ScalarField::new(grid, SampleLocation::Node, FAR_DISTANCE);
        let mut markers = MarkerField::new(grid, SampleLocation::Node, Marker::Far);
        let mut velocity = VectorField::new(grid, SampleLocation::Node, Vec3::zeros());
        let mut fields = VoxelFields::new(&mut distance, &mut markers).with_velocity(&mut velocity);

        // Velocity varies linearly with x across the square
        let mesh = square(3.25).with_velocities(vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ]);
        rasterize_mesh(&grid, 1e-6, &mut fields, &mesh);
        assert!((velocity[[4, 2, 3]].x - 4.0).abs() < 1e-9);
        assert!((velocity[[2, 5, 4]].x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_triangle_skipped() {
        let grid = grid();
        let mut distance = ScalarField::new(grid, SampleLocation::Cell, FAR_DISTANCE);
        let mut markers = MarkerField::new(grid, SampleLocation::Cell, Marker::Far);
        let mut fields = VoxelFields::new(&mut distance, &mut markers);

        let mesh = TriangleMesh::from_parts(
            vec![
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(2.0, 2.0, 2.0),
                Point3::new(3.0, 3.0, 3.0),
            ],
            vec![[0, 1, 2]],
        );
        let stats = rasterize_mesh(&grid, 1e-6, &mut fields, &mesh);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.writes, 0);
        assert!(markers.data().iter().all(|&m| m == Marker::Far));
    }
}
