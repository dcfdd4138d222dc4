//! Axis-aligned bounding boxes.
//!
//! [`Aabb3`] is the pruning primitive for the spatial index and the
//! rasterization window for the voxelizer. An *empty* box (inverted, with
//! `min = +inf` and `max = -inf`) stands for "not initialized": it overlaps
//! nothing and every point is infinitely far from it.

use crate::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB spanning two corners, in any order.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Tightest box around a triangle.
    pub fn from_triangle(a: &Point3, b: &Point3, c: &Point3) -> Self {
        let mut aabb = Self::new(*a, *b);
        aabb.expand_point(c);
        aabb
    }

    /// Tightest box around a set of points. Empty if the iterator is.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.expand_point(p);
        }
        aabb
    }

    /// True if the box has never been expanded.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn expand_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box. Empty boxes are ignored.
    pub fn expand_box(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.expand_point(&other.min);
        self.expand_point(&other.max);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Aabb3) -> Self {
        let mut out = *self;
        out.expand_box(other);
        out
    }

    /// Grow the box by `tol` on every side. No-op on an empty box.
    pub fn pad(&mut self, tol: f64) {
        if self.is_empty() {
            return;
        }
        self.min -= Vec3::repeat(tol);
        self.max += Vec3::repeat(tol);
    }

    /// Box center. Meaningless for an empty box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths along x, y and z (zero for an empty box).
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::zeros();
        }
        self.max - self.min
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z); ties go to the lower axis.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// True if `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Test if two AABBs overlap (touching counts as overlap).
    pub fn intersects(&self, other: &Aabb3) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Distance from `p` to the closest point of the box.
    ///
    /// Exactly `0.0` for any point inside the box, which is what makes it a
    /// sound lower bound for branch-and-bound searches. Returns infinity for
    /// an empty box.
    pub fn distance_from_outside(&self, p: &Point3, squared: bool) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        let dz = (self.min.z - p.z).max(0.0).max(p.z - self.max.z);
        let d2 = dx * dx + dy * dy + dz * dz;
        if squared {
            d2
        } else {
            d2.sqrt()
        }
    }

    /// Bisect the box along its longest axis.
    pub fn split(&self) -> (Aabb3, Aabb3) {
        if self.is_empty() {
            return (Self::empty(), Self::empty());
        }
        let axis = self.longest_axis();
        let mid = 0.5 * (self.min[axis] + self.max[axis]);

        let mut lower = *self;
        let mut upper = *self;
        lower.max[axis] = mid;
        upper.min[axis] = mid;
        (lower, upper)
    }

    /// The eight corners. Bit 0 of the index selects max x, bit 1 max y, bit 2 max z.
    pub fn corners(&self) -> [Point3; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Test against a sphere.
    pub fn intersects_sphere(&self, center: &Point3, radius: f64) -> bool {
        self.distance_from_outside(center, true) <= radius * radius
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` with `t_min >= 0` if the ray
    /// `origin + t * direction` (t >= 0) hits the box.
    pub fn intersects_ray(&self, origin: &Point3, direction: &Vec3) -> Option<(f64, f64)> {
        let (t_min, t_max) = self.slab(origin, direction)?;
        if t_max < 0.0 {
            return None;
        }
        Some((t_min.max(0.0), t_max))
    }

    /// Test a segment from `a` to `b`.
    pub fn intersects_segment(&self, a: &Point3, b: &Point3) -> bool {
        match self.slab(a, &(b - a)) {
            Some((t_min, t_max)) => t_min <= 1.0 && t_max >= 0.0,
            None => false,
        }
    }

    /// Parametric interval of the infinite line `origin + t * dir` inside the box.
    fn slab(&self, origin: &Point3, dir: &Vec3) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < f64::EPSILON {
                // Parallel to this slab
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t1 = (self.min[axis] - o) * inv;
            let mut t2 = (self.max[axis] - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_max < t_min {
                return None;
            }
        }

        Some((t_min, t_max))
    }

    /// Exact triangle-box overlap via the separating axis theorem.
    ///
    /// Tests the three box normals, the triangle normal and the nine
    /// edge cross products.
    pub fn intersects_triangle(&self, a: &Point3, b: &Point3, c: &Point3) -> bool {
        if self.is_empty() {
            return false;
        }
        if !self.intersects(&Aabb3::from_triangle(a, b, c)) {
            return false;
        }

        let center = self.center();
        let half = self.extent() * 0.5;
        let v = [a - center, b - center, c - center];
        let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

        let separated = |axis: &Vec3| {
            let p0 = v[0].dot(axis);
            let p1 = v[1].dot(axis);
            let p2 = v[2].dot(axis);
            let r = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
            p0.min(p1).min(p2) > r || p0.max(p1).max(p2) < -r
        };

        let units = [Vec3::x(), Vec3::y(), Vec3::z()];
        for unit in &units {
            for edge in &edges {
                if separated(&unit.cross(edge)) {
                    return false;
                }
            }
        }

        let normal = edges[0].cross(&edges[1]);
        !separated(&normal)
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}
