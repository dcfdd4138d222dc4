//! Property-based tests for bounding box queries.
//!
//! Run with: cargo test -p distfield-math -- proptest

use distfield_math::{closest_point_on_triangle, Aabb3, Point3};
use proptest::prelude::*;

fn arb_point() -> impl Strategy<Value = Point3> {
    prop::array::uniform3(-50.0..50.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_box() -> impl Strategy<Value = Aabb3> {
    (arb_point(), arb_point()).prop_map(|(a, b)| Aabb3::new(a, b))
}

/// Point strictly inside a box, given per-axis interpolation weights.
fn lerp_inside(aabb: &Aabb3, t: [f64; 3]) -> Point3 {
    Point3::new(
        aabb.min.x + (aabb.max.x - aabb.min.x) * t[0],
        aabb.min.y + (aabb.max.y - aabb.min.y) * t[1],
        aabb.min.z + (aabb.max.z - aabb.min.z) * t[2],
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn proptest_inside_points_have_zero_distance(
        aabb in arb_box(),
        t in prop::array::uniform3(0.0..=1.0f64),
    ) {
        let p = lerp_inside(&aabb, t);
        prop_assume!(aabb.contains_point(&p));
        prop_assert_eq!(aabb.distance_from_outside(&p, false), 0.0);
        prop_assert_eq!(aabb.distance_from_outside(&p, true), 0.0);
    }

    #[test]
    fn proptest_outside_points_have_positive_distance(aabb in arb_box(), p in arb_point()) {
        let d = aabb.distance_from_outside(&p, false);
        if aabb.contains_point(&p) {
            prop_assert_eq!(d, 0.0);
        } else {
            prop_assert!(d > 0.0);
        }
    }

    #[test]
    fn proptest_distance_is_lower_bound_for_contents(
        aabb in arb_box(),
        t in prop::array::uniform3(0.0..=1.0f64),
        p in arb_point(),
    ) {
        // Any point inside the box is at least as far as the box itself
        let q = lerp_inside(&aabb, t);
        let lower = aabb.distance_from_outside(&p, false);
        prop_assert!(lower <= (p - q).norm() + 1e-9);
    }

    #[test]
    fn proptest_split_halves_cover_parent(aabb in arb_box(), p in arb_point()) {
        let (lo, hi) = aabb.split();
        if aabb.contains_point(&p) {
            prop_assert!(lo.contains_point(&p) || hi.contains_point(&p));
        }
        prop_assert_eq!(lo.union(&hi), aabb);
    }

    #[test]
    fn proptest_triangle_box_overlap_agrees_with_closest_point(
        aabb in arb_box(),
        a in arb_point(),
        b in arb_point(),
        c in arb_point(),
    ) {
        // If the closest point on the triangle to the box center is inside
        // the box, the triangle certainly overlaps it.
        let hit = closest_point_on_triangle(&aabb.center(), &a, &b, &c);
        if aabb.contains_point(&hit.point) {
            prop_assert!(aabb.intersects_triangle(&a, &b, &c));
        }
    }
}
