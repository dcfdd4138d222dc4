//! End-to-end voxelization scenarios on analytic shapes.

use distfield_grid::{Grid, Marker, MarkerField, SampleLocation, ScalarField, VectorField};
use distfield_math::{Point3, Vec3};
use distfield_mesh::{make_box, make_icosphere, TriangleMesh};
use distfield_voxel::{VoxelFields, VoxelizeReport, VoxelizeSettings, Voxelizer, FAR_DISTANCE};

struct Output {
    distance: ScalarField,
    markers: MarkerField,
    velocity: VectorField,
    report: VoxelizeReport,
}

fn run(
    grid: Grid,
    location: SampleLocation,
    settings: VoxelizeSettings,
    meshes: &[&TriangleMesh],
) -> Output {
    let voxelizer = Voxelizer::new(grid, settings).unwrap();
    let mut distance = ScalarField::new(grid, location, 0.0);
    let mut markers = MarkerField::new(grid, location, Marker::Far);
    let mut velocity = VectorField::new(grid, location, Vec3::zeros());
    let report = voxelizer
        .voxelize(
            VoxelFields::new(&mut distance, &mut markers).with_velocity(&mut velocity),
            meshes.iter().copied(),
        )
        .unwrap();
    Output {
        distance,
        markers,
        velocity,
        report,
    }
}

fn sphere_grid() -> Grid {
    Grid::from_cell_size([40, 40, 40], Point3::new(-2.0, -2.0, -2.0), 0.1).unwrap()
}

fn unit_sphere() -> TriangleMesh {
    make_icosphere(Point3::origin(), 1.0, 3)
}

/// Follow strictly decreasing magnitudes until an interface sample.
fn reaches_interface(out: &Output, start: [usize; 3]) -> bool {
    let mut current = start;
    loop {
        match out.markers[current] {
            Marker::Interface => return true,
            Marker::Updated => {}
            _ => return false,
        }
        let here = out.distance[current].abs();
        let next = out
            .distance
            .neighbors(current)
            .filter(|&nb| out.markers[nb].is_resolved() && out.distance[nb].abs() < here)
            .min_by(|&a, &b| out.distance[a].abs().total_cmp(&out.distance[b].abs()));
        match next {
            Some(nb) => current = nb,
            None => return false,
        }
    }
}

#[test]
fn sphere_matches_analytic_distance() {
    let grid = sphere_grid();
    let h = 0.1;
    let out = run(grid, SampleLocation::Cell, VoxelizeSettings::with_range(0.5), &[&unit_sphere()]);

    assert_eq!(out.report.meshes, 1);
    assert!(out.report.interface > 0);
    assert!(out.report.updated > 0);

    for idx in 0..out.distance.len() {
        let ijk = out.distance.coord_of(idx);
        if !out.markers[ijk].is_resolved() {
            continue;
        }
        let p = out.distance.position(ijk);
        let exact = p.coords.norm() - 1.0;
        let phi = out.distance[ijk];
        assert!((phi - exact).abs() < 2.0 * h, "sample {ijk:?}: {phi} vs {exact}");
    }

    // The center is deeper than the band
    assert_eq!(out.markers[[20, 20, 20]], Marker::Far);
    assert_eq!(out.distance[[20, 20, 20]], FAR_DISTANCE);
}

#[test]
fn narrow_band_is_truncated() {
    let grid = sphere_grid();
    let h = 0.1;
    let range = 0.3;
    let settings = VoxelizeSettings::with_range(range);
    let out = run(grid, SampleLocation::Cell, settings, &[&unit_sphere()]);

    for idx in 0..out.distance.len() {
        let ijk = out.distance.coord_of(idx);
        let exact = out.distance.position(ijk).coords.norm() - 1.0;
        let marker = out.markers[ijk];
        if exact.abs() > range + 2.0 * h {
            assert_eq!(marker, Marker::Far, "sample {ijk:?} at {exact}");
            assert_eq!(out.distance[ijk], FAR_DISTANCE);
        }
        if exact.abs() < range - h {
            assert!(marker.is_resolved(), "sample {ijk:?} at {exact}");
        }
        assert_ne!(marker, Marker::Trial);
    }
    assert_eq!(
        out.report.far,
        out.markers.data().iter().filter(|&&m| m == Marker::Far).count()
    );
}

#[test]
fn every_updated_sample_descends_to_interface() {
    let out = run(
        sphere_grid(),
        SampleLocation::Cell,
        VoxelizeSettings::with_range(0.4),
        &[&unit_sphere()],
    );
    let mut checked = 0;
    for idx in 0..out.distance.len() {
        let ijk = out.distance.coord_of(idx);
        if out.markers[ijk] == Marker::Updated {
            assert!(reaches_interface(&out, ijk), "no descending path from {ijk:?}");
            checked += 1;
        }
    }
    assert_eq!(checked, out.report.updated);
}

#[test]
fn unit_cube_center_cell() {
    let grid = Grid::new(
        [10, 10, 10],
        Point3::new(-1.5, -1.5, -1.5),
        Point3::new(1.5, 1.5, 1.5),
    )
    .unwrap();
    let cube = make_box(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
    let out = run(grid, SampleLocation::Cell, VoxelizeSettings::default(), &[&cube]);

    let h = grid.cell_size().x;
    for ijk in [[4, 4, 4], [5, 5, 5], [4, 5, 4]] {
        let d = out.distance[ijk];
        assert!(d < 0.0, "cell {ijk:?} = {d}");
        assert!((d.abs() - 0.5).abs() < h, "cell {ijk:?} = {d}");
    }
    // Corner cell is outside
    assert!(out.distance[[0, 0, 0]] > 0.0);
}

#[test]
fn node_located_cube() {
    let grid = Grid::from_cell_size([12, 12, 12], Point3::new(-1.2, -1.2, -1.2), 0.2).unwrap();
    let cube = make_box(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
    let out = run(grid, SampleLocation::Node, VoxelizeSettings::with_range(1.0), &[&cube]);

    // Node (6, 6, 6) is the origin, 0.5 from every face
    assert!((out.distance[[6, 6, 6]] + 0.5).abs() < 0.2);
    // Node (6, 6, 9) is at z = 0.6, just outside the top face
    assert!((out.distance[[6, 6, 9]] - 0.1).abs() < 1e-9);
    assert_eq!(out.markers[[6, 6, 9]], Marker::Interface);
}

#[test]
fn adding_a_mesh_twice_changes_nothing() {
    let sphere = unit_sphere();
    let settings = VoxelizeSettings::with_range(0.4);
    let once = run(sphere_grid(), SampleLocation::Cell, settings, &[&sphere]);
    let twice = run(sphere_grid(), SampleLocation::Cell, settings, &[&sphere, &sphere]);

    assert_eq!(once.distance.data(), twice.distance.data());
    assert_eq!(once.markers.data(), twice.markers.data());
    assert_eq!(twice.report.meshes, 2);
    assert_eq!(once.report.interface, twice.report.interface);
    assert_eq!(once.report.min, twice.report.min);
}

#[test]
fn uniform_velocity_is_transported() {
    let v = Vec3::new(1.0, -2.0, 0.5);
    let sphere = unit_sphere().with_uniform_velocity(v);
    let settings = VoxelizeSettings::with_range(0.3);
    let out = run(sphere_grid(), SampleLocation::Cell, settings, &[&sphere]);

    for idx in 0..out.velocity.len() {
        let ijk = out.velocity.coord_of(idx);
        let vel = out.velocity[ijk];
        if out.markers[ijk].is_resolved() {
            assert!((vel - v).norm() < 1e-9, "sample {ijk:?}: {vel:?}");
        } else {
            assert_eq!(vel, Vec3::zeros());
        }
    }
}

#[test]
fn mesh_without_velocities_writes_zero() {
    let out = run(
        sphere_grid(),
        SampleLocation::Cell,
        VoxelizeSettings::with_range(0.3),
        &[&unit_sphere()],
    );
    assert!(out.velocity.data().iter().all(|v| *v == Vec3::zeros()));
}

#[test]
fn separate_meshes_combine() {
    let left = make_icosphere(Point3::new(-1.0, 0.0, 0.0), 0.6, 2);
    let right = make_box(Point3::new(0.5, -0.5, -0.5), Point3::new(1.5, 0.5, 0.5));
    let grid = sphere_grid();
    let out = run(grid, SampleLocation::Cell, VoxelizeSettings::with_range(0.8), &[&left, &right]);

    let sample_at = |p: Point3| {
        let s = grid.to_sample_space(SampleLocation::Cell, &p);
        [s.x.round() as usize, s.y.round() as usize, s.z.round() as usize]
    };
    assert!(out.distance[sample_at(Point3::new(-1.05, 0.05, 0.05))] < 0.0);
    assert!(out.distance[sample_at(Point3::new(1.05, 0.05, 0.05))] < 0.0);
    assert!(out.distance[sample_at(Point3::new(0.05, 0.05, 0.05))] > 0.0);

    let (min, max) = out.distance.range().unwrap();
    assert_eq!(Some(min), out.report.min);
    assert_eq!(Some(max), out.report.max);
    assert!(min < 0.0 && max > 0.0);
}
