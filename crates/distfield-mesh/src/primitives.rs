//! Closed triangle meshes for standard shapes.
//!
//! All primitives are watertight with counter-clockwise, outward-facing
//! triangles, so they can be voxelized into signed distance fields directly.

use std::collections::HashMap;

use distfield_math::{Point3, Vec3};

use crate::TriangleMesh;

/// Build an axis-aligned box spanning `min` to `max`.
///
/// The box has 8 vertices and 12 triangles (two per face).
/// Vertex layout:
/// ```text
///     v4----v5
///    /|    /|
///   v7----v6|    z
///   | v0--|-v1   | y
///   |/    |/     |/
///   v3----v2     +---x
/// ```
pub fn make_box(min: Point3, max: Point3) -> TriangleMesh {
    let positions = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    // Each face as a CCW quad viewed from outside, split along its first diagonal
    let quads: [[u32; 4]; 6] = [
        [0, 3, 2, 1], // -Z
        [4, 5, 6, 7], // +Z
        [0, 1, 5, 4], // -Y
        [3, 7, 6, 2], // +Y
        [0, 4, 7, 3], // -X
        [1, 2, 6, 5], // +X
    ];
    let triangles = quads
        .iter()
        .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
        .collect();

    TriangleMesh::from_parts(positions, triangles)
}

/// Build a sphere by subdividing an icosahedron `subdivisions` times.
///
/// Produces `20 * 4^subdivisions` triangles with every vertex exactly
/// `radius` away from `center`.
pub fn make_icosphere(center: Point3, radius: f64, subdivisions: u32) -> TriangleMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut dirs: Vec<Vec3> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|v| Vec3::new(v[0], v[1], v[2]).normalize())
    .collect();

    let mut triangles: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, dirs: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let m = (dirs[a as usize] + dirs[b as usize]).normalize();
                dirs.push(m);
                (dirs.len() - 1) as u32
            })
        };

        let mut next = Vec::with_capacity(triangles.len() * 4);
        for &[a, b, c] in &triangles {
            let ab = midpoint(a, b, &mut dirs);
            let bc = midpoint(b, c, &mut dirs);
            let ca = midpoint(c, a, &mut dirs);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        triangles = next;
    }

    let positions = dirs.iter().map(|d| center + d * radius).collect();
    TriangleMesh::from_parts(positions, triangles)
}
