//! Two-heap Fast Marching.
//!
//! Distances here are in cells. The inside (negative) front is marched to
//! completion before the outside (positive) one; each front only grows
//! through samples whose solved magnitude is still within its range.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use distfield_grid::{face_neighbors, Marker};
use distfield_math::Vec3;

use crate::VoxelFields;

/// A queued sample, ordered so that `BinaryHeap` pops the smallest
/// `|priority|` first.
#[derive(Debug, Clone, Copy)]
struct Trial {
    coord: [usize; 3],
    priority: f64,
}

impl PartialEq for Trial {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Trial {}

impl Ord for Trial {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap; ties broken on coordinates for a stable order
        other
            .priority
            .abs()
            .total_cmp(&self.priority.abs())
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for Trial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Counters from one march.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MarchStats {
    pub seeded_negative: usize,
    pub seeded_positive: usize,
    pub solved: usize,
    pub pushed: usize,
}

/// March both fronts out from the interface samples.
///
/// `neg_range` and `pos_range` are in cells.
pub(crate) fn march(fields: &mut VoxelFields<'_>, neg_range: f64, pos_range: f64) -> MarchStats {
    let dims = fields.distance.dims();
    let mut stats = MarchStats::default();
    let mut negative = BinaryHeap::new();
    let mut positive = BinaryHeap::new();

    for idx in 0..fields.markers.len() {
        if fields.markers.data()[idx] != Marker::Interface {
            continue;
        }
        let coord = fields.markers.coord_of(idx);
        let value = fields.distance.data()[idx];
        for (_, nb) in face_neighbors(dims, coord) {
            if fields.markers[nb] != Marker::Far {
                continue;
            }
            fields.markers[nb] = Marker::Trial;
            if value < 0.0 {
                negative.push(Trial {
                    coord: nb,
                    priority: value - 1.0,
                });
                stats.seeded_negative += 1;
            } else {
                positive.push(Trial {
                    coord: nb,
                    priority: value + 1.0,
                });
                stats.seeded_positive += 1;
            }
        }
    }

    drain(&mut negative, -1.0, neg_range, dims, fields, &mut stats);
    drain(&mut positive, 1.0, pos_range, dims, fields, &mut stats);
    stats
}

fn drain(
    heap: &mut BinaryHeap<Trial>,
    sign: f64,
    range: f64,
    dims: [usize; 3],
    fields: &mut VoxelFields<'_>,
    stats: &mut MarchStats,
) {
    while let Some(Trial { coord, .. }) = heap.pop() {
        // Smallest resolved magnitude along each axis
        let mut upwind = [f64::INFINITY; 3];
        for (axis, nb) in face_neighbors(dims, coord) {
            if fields.markers[nb].is_resolved() {
                upwind[axis] = upwind[axis].min(fields.distance[nb].abs());
            }
        }

        let Some(magnitude) = solve_eikonal(upwind) else {
            fields.markers[coord] = Marker::Far;
            continue;
        };

        if magnitude < fields.distance[coord].abs() {
            fields.distance[coord] = sign * magnitude;
        }
        fields.markers[coord] = Marker::Updated;
        stats.solved += 1;

        if let Some(velocity) = fields.velocity.as_deref_mut() {
            let mut sum = Vec3::zeros();
            let mut count = 0usize;
            for (_, nb) in face_neighbors(dims, coord) {
                if fields.markers[nb].is_resolved() {
                    sum += velocity[nb];
                    count += 1;
                }
            }
            if count > 0 {
                velocity[coord] = sum / count as f64;
            }
        }

        let value = fields.distance[coord];
        if value.abs() > range {
            continue;
        }
        for (_, nb) in face_neighbors(dims, coord) {
            if fields.markers[nb] == Marker::Far {
                fields.markers[nb] = Marker::Trial;
                heap.push(Trial {
                    coord: nb,
                    priority: value + sign,
                });
                stats.pushed += 1;
            }
        }
    }
}

/// Solve `|grad u| = 1` on a unit grid from per-axis upwind values.
///
/// Infinite entries carry no information. Axes are added smallest first
/// while the solution still exceeds the next upwind value. Returns `None`
/// when no axis has a value.
pub(crate) fn solve_eikonal(mut upwind: [f64; 3]) -> Option<f64> {
    upwind.sort_by(f64::total_cmp);
    let known = upwind.iter().take_while(|a| a.is_finite()).count();
    if known == 0 {
        return None;
    }

    let mut u = upwind[0] + 1.0;
    for n in 2..=known {
        if u <= upwind[n - 1] {
            break;
        }
        let used = &upwind[..n];
        let sum: f64 = used.iter().sum();
        let sum_sq: f64 = used.iter().map(|a| a * a).sum();
        let nf = n as f64;
        let disc = sum * sum - nf * (sum_sq - 1.0);
        if disc < 0.0 {
            break;
        }
        u = (sum + disc.sqrt()) / nf;
    }
    Some(u)
}
