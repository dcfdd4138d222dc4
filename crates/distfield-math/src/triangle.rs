//! Closest-point and projection routines on single triangles.

use crate::{Point3, Vec3};

/// Closest point on a triangle together with its barycentric coordinates.
#[derive(Debug, Clone, Copy)]
pub struct TrianglePoint {
    /// The closest point.
    pub point: Point3,
    /// Weights of the triangle's corners 0, 1 and 2. They sum to 1.
    pub bary: [f64; 3],
}

impl TrianglePoint {
    fn new(point: Point3, bary: [f64; 3]) -> Self {
        Self { point, bary }
    }
}

/// Compute the closest point on triangle `(a, b, c)` to `p`.
///
/// Classifies `p` against the Voronoi regions of the triangle's vertices,
/// edges and face; falls back to the three edges when the triangle is
/// degenerate.
#[allow(clippy::many_single_char_names)]
pub fn closest_point_on_triangle(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> TrianglePoint {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return TrianglePoint::new(*a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return TrianglePoint::new(*b, [0.0, 1.0, 0.0]);
    }

    let vc = d1.mul_add(d4, -(d3 * d2));
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return TrianglePoint::new(a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return TrianglePoint::new(*c, [0.0, 0.0, 1.0]);
    }

    let vb = d5.mul_add(d2, -(d1 * d6));
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return TrianglePoint::new(a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3.mul_add(d6, -(d5 * d4));
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return TrianglePoint::new(b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let sum = va + vb + vc;
    if sum.abs() < f64::MIN_POSITIVE {
        return closest_on_edges(p, a, b, c);
    }
    let v = vb / sum;
    let w = vc / sum;
    TrianglePoint::new(a + ab * v + ac * w, [1.0 - v - w, v, w])
}

/// Closest point over the three edges of a (degenerate) triangle.
fn closest_on_edges(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> TrianglePoint {
    let candidates = [
        (segment_param(p, a, b), 0usize, 1usize),
        (segment_param(p, b, c), 1, 2),
        (segment_param(p, c, a), 2, 0),
    ];
    let corners = [a, b, c];

    let mut best = TrianglePoint::new(*a, [1.0, 0.0, 0.0]);
    let mut best_d2 = (p - a).norm_squared();
    for (t, i, j) in candidates {
        let q = corners[i] + (corners[j] - corners[i]) * t;
        let d2 = (p - q).norm_squared();
        if d2 < best_d2 {
            let mut bary = [0.0; 3];
            bary[i] = 1.0 - t;
            bary[j] = t;
            best = TrianglePoint::new(q, bary);
            best_d2 = d2;
        }
    }
    best
}

/// Parameter in [0, 1] of the closest point on segment `ab` to `p`.
fn segment_param(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < f64::MIN_POSITIVE {
        return 0.0;
    }
    ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
}

/// Unit normal of a counter-clockwise triangle, `None` if it has no area.
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Option<Vec3> {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len > 1e-12 {
        Some(n / len)
    } else {
        None
    }
}

/// Barycentric coordinates of 2D point `p` with respect to triangle `(a, b, c)`.
///
/// Returns `None` when the projected triangle has (near) zero area. The
/// coordinates are not clamped; callers decide how much slack to allow
/// outside the triangle.
pub fn barycentric_2d(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<[f64; 3]> {
    let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
    if det.abs() < 1e-14 {
        return None;
    }
    let l0 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
    let l1 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
    Some([l0, l1, 1.0 - l0 - l1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> (Point3, Point3, Point3) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    fn reconstruct(hit: &TrianglePoint, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
        Point3::from(a.coords * hit.bary[0] + b.coords * hit.bary[1] + c.coords * hit.bary[2])
    }

    #[test]
    fn test_closest_point_face_region() {
        let (a, b, c) = tri();
        let hit = closest_point_on_triangle(&Point3::new(0.25, 0.25, 2.0), &a, &b, &c);
        assert_relative_eq!(hit.point, Point3::new(0.25, 0.25, 0.0), epsilon = 1e-12);
        assert_relative_eq!(hit.bary[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.bary[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.bary[2], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_closest_point_vertex_regions() {
        let (a, b, c) = tri();
        let hit = closest_point_on_triangle(&Point3::new(-1.0, -1.0, 0.5), &a, &b, &c);
        assert_eq!(hit.point, a);
        assert_eq!(hit.bary, [1.0, 0.0, 0.0]);

        let hit = closest_point_on_triangle(&Point3::new(3.0, -0.5, 0.0), &a, &b, &c);
        assert_eq!(hit.point, b);

        let hit = closest_point_on_triangle(&Point3::new(-0.5, 3.0, 0.0), &a, &b, &c);
        assert_eq!(hit.point, c);
    }

    #[test]
    fn test_closest_point_edge_regions() {
        let (a, b, c) = tri();
        let hit = closest_point_on_triangle(&Point3::new(0.5, -1.0, 0.0), &a, &b, &c);
        assert_relative_eq!(hit.point, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);

        let hit = closest_point_on_triangle(&Point3::new(1.0, 1.0, 0.0), &a, &b, &c);
        assert_relative_eq!(hit.point, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(hit.bary[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.bary[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_barycentrics_reconstruct_point() {
        let a = Point3::new(0.3, -1.0, 2.0);
        let b = Point3::new(2.0, 0.5, -1.0);
        let c = Point3::new(-1.0, 2.0, 0.0);
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(-3.0, 1.0, 0.2),
        ] {
            let hit = closest_point_on_triangle(&p, &a, &b, &c);
            let sum: f64 = hit.bary.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            assert_relative_eq!(reconstruct(&hit, &a, &b, &c), hit.point, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_triangle() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        let hit = closest_point_on_triangle(&Point3::new(1.5, 1.0, 0.0), &a, &b, &c);
        assert_relative_eq!(hit.point, Point3::new(1.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_triangle_normal() {
        let (a, b, c) = tri();
        let n = triangle_normal(&a, &b, &c).unwrap();
        assert_relative_eq!(n, Vec3::z(), epsilon = 1e-12);
        assert!(triangle_normal(&a, &a, &b).is_none());
    }

    #[test]
    fn test_barycentric_2d() {
        let l = barycentric_2d([0.25, 0.25], [0.0, 0.0], [1.0, 0.0], [0.0, 1.0]).unwrap();
        assert_relative_eq!(l[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(l[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(l[2], 0.25, epsilon = 1e-12);

        let outside = barycentric_2d([2.0, 2.0], [0.0, 0.0], [1.0, 0.0], [0.0, 1.0]).unwrap();
        assert!(outside[0] < 0.0);

        assert!(barycentric_2d([0.0, 0.0], [0.0, 0.0], [1.0, 1.0], [2.0, 2.0]).is_none());
    }
}
