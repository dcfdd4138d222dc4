//! Closest-point and overlap queries.

use distfield_math::{closest_point_on_triangle, Aabb3, Point3};
use distfield_mesh::TriangleSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Bvh;

/// Result of a closest-point query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestHit {
    /// Distance from the query point to `point`.
    pub distance: f64,
    /// Closest point on the mesh.
    pub point: Point3,
    /// Index of the triangle containing `point`.
    pub triangle: usize,
    /// Barycentric weight of the triangle's first corner.
    pub bary_a: f64,
    /// Barycentric weight of the triangle's second corner.
    pub bary_b: f64,
}

impl ClosestHit {
    /// Barycentric weight of the triangle's third corner.
    pub fn bary_c(&self) -> f64 {
        1.0 - self.bary_a - self.bary_b
    }
}

/// Running state of a branch-and-bound search.
struct Search {
    best_sq: f64,
    hit: Option<ClosestHit>,
}

impl<S: TriangleSource> Bvh<S> {
    /// Find the closest point on the mesh to `p`.
    ///
    /// Only points strictly closer than `max_distance` are considered; pass
    /// `f64::INFINITY` for an unbounded search. Returns `None` for an empty
    /// mesh or when nothing lies within range.
    pub fn closest_point(&self, p: &Point3, max_distance: f64) -> Option<ClosestHit> {
        if self.is_empty() || max_distance.is_nan() || max_distance <= 0.0 {
            return None;
        }

        let mut search = Search {
            best_sq: max_distance * max_distance,
            hit: None,
        };
        self.closest_in_cell(0, p, &mut search);
        search.hit
    }

    fn closest_in_cell(&self, idx: usize, p: &Point3, search: &mut Search) {
        let cell = &self.cells[idx];

        // Early out if the cell is beyond the current best
        if cell.bounds.distance_from_outside(p, true) >= search.best_sq {
            return;
        }

        match cell.children {
            None => {
                for &tri in &cell.triangles {
                    if self.triangle_bounds[tri].distance_from_outside(p, true) >= search.best_sq {
                        continue;
                    }
                    let [a, b, c] = self.source.triangle(tri);
                    let tp = closest_point_on_triangle(p, &a, &b, &c);
                    let d_sq = (tp.point - p).norm_squared();
                    if d_sq < search.best_sq {
                        search.best_sq = d_sq;
                        search.hit = Some(ClosestHit {
                            distance: d_sq.sqrt(),
                            point: tp.point,
                            triangle: tri,
                            bary_a: tp.bary[0],
                            bary_b: tp.bary[1],
                        });
                    }
                }
            }
            Some((left, right)) => {
                // Visit the nearer child first so the bound tightens sooner
                let dl = self.cells[left].bounds.distance_from_outside(p, true);
                let dr = self.cells[right].bounds.distance_from_outside(p, true);
                if dl <= dr {
                    self.closest_in_cell(left, p, search);
                    self.closest_in_cell(right, p, search);
                } else {
                    self.closest_in_cell(right, p, search);
                    self.closest_in_cell(left, p, search);
                }
            }
        }
    }

    /// Run [`closest_point`](Self::closest_point) for many points in parallel.
    pub fn closest_points(&self, points: &[Point3], max_distance: f64) -> Vec<Option<ClosestHit>>
    where
        S: Sync,
    {
        points
            .par_iter()
            .map(|p| self.closest_point(p, max_distance))
            .collect()
    }

    /// Triangles that may overlap `query`.
    ///
    /// Descends while `query` touches exactly one child and returns the
    /// triangle list of the cell where the descent stops. The list is a
    /// superset of the overlapping triangles; with `exact` it is filtered
    /// down to triangles that actually intersect the box.
    pub fn triangles_overlapping(&self, query: &Aabb3, exact: bool) -> Vec<usize> {
        if self.is_empty() || !self.cells[0].bounds.intersects(query) {
            return Vec::new();
        }

        let mut idx = 0;
        while let Some((left, right)) = self.cells[idx].children {
            let hit_left = self.cells[left].bounds.intersects(query);
            let hit_right = self.cells[right].bounds.intersects(query);
            match (hit_left, hit_right) {
                (true, false) => idx = left,
                (false, true) => idx = right,
                (true, true) => break,
                (false, false) => return Vec::new(),
            }
        }

        let candidates = &self.cells[idx].triangles;
        if !exact {
            return candidates.clone();
        }

        candidates
            .iter()
            .copied()
            .filter(|&tri| {
                let [a, b, c] = self.source.triangle(tri);
                query.intersects_triangle(&a, &b, &c)
            })
            .collect()
    }
}
