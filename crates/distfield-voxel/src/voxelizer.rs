//! Voxelizer and its per-run session.

use std::marker::PhantomData;

use distfield_grid::{finite_range, Grid, Marker, MarkerField, ScalarField, VectorField};
use distfield_math::Vec3;
use distfield_mesh::{TriangleMesh, TriangleSource};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    fmm, rasterize, Result, VoxelizeError, VoxelizeReport, VoxelizeSettings, FAR_DISTANCE,
    UNIFORM_CELL_TOLERANCE,
};

/// Fields written by a voxelization run.
///
/// All fields must sample the voxelizer's grid at the same location.
#[derive(Debug)]
pub struct VoxelFields<'a> {
    /// Signed distance, negative inside.
    pub distance: &'a mut ScalarField,
    /// Per-sample state.
    pub markers: &'a mut MarkerField,
    /// Transported surface velocity.
    pub velocity: Option<&'a mut VectorField>,
}

impl<'a> VoxelFields<'a> {
    /// Bind distance and marker fields.
    pub fn new(distance: &'a mut ScalarField, markers: &'a mut MarkerField) -> Self {
        Self {
            distance,
            markers,
            velocity: None,
        }
    }

    /// Also bind a velocity field.
    pub fn with_velocity(mut self, velocity: &'a mut VectorField) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

/// Converts triangle meshes into narrow-band signed distance fields on one grid.
#[derive(Debug, Clone, Copy)]
pub struct Voxelizer {
    grid: Grid,
    settings: VoxelizeSettings,
    cell_size: f64,
}

impl Voxelizer {
    /// Create a voxelizer for `grid`.
    ///
    /// The grid's cells must be cubes.
    pub fn new(grid: Grid, settings: VoxelizeSettings) -> Result<Self> {
        settings.validate()?;
        let cell_size = grid
            .uniform_cell_size(UNIFORM_CELL_TOLERANCE)
            .ok_or(VoxelizeError::NonUniformCells(grid.cell_size()))?;
        Ok(Self {
            grid,
            settings,
            cell_size,
        })
    }

    /// The grid being voxelized.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Voxelizer settings.
    pub fn settings(&self) -> &VoxelizeSettings {
        &self.settings
    }

    /// Edge length of a grid cell.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Bind fields and start a session.
    ///
    /// Checks that every field samples this voxelizer's grid at the distance
    /// field's location, then resets distances to [`FAR_DISTANCE`], markers
    /// to [`Marker::Far`] and velocities to zero. Nothing is written if a
    /// check fails.
    pub fn begin<'a>(&self, mut fields: VoxelFields<'a>) -> Result<VoxelizeSession<'a, Unseeded>> {
        self.check_fields(&fields)?;

        fields.distance.fill(FAR_DISTANCE);
        fields.markers.fill(Marker::Far);
        if let Some(velocity) = fields.velocity.as_deref_mut() {
            velocity.fill(Vec3::zeros());
        }

        Ok(VoxelizeSession {
            voxelizer: *self,
            fields,
            meshes: 0,
            _state: PhantomData,
        })
    }

    /// Voxelize `meshes` into `fields` in one go.
    pub fn voxelize<'m>(
        &self,
        fields: VoxelFields<'_>,
        meshes: impl IntoIterator<Item = &'m TriangleMesh>,
    ) -> Result<VoxelizeReport> {
        let mut meshes = meshes.into_iter();
        let first = meshes.next().ok_or(VoxelizeError::NoMeshes)?;
        let mut session = self.begin(fields)?.add_mesh(first)?;
        for mesh in meshes {
            session = session.add_mesh(mesh)?;
        }
        Ok(session.finalize())
    }

    fn check_fields(&self, fields: &VoxelFields<'_>) -> Result<()> {
        let location = fields.distance.location();
        if *fields.distance.grid() != self.grid {
            return Err(VoxelizeError::GridMismatch("distance"));
        }
        if *fields.markers.grid() != self.grid {
            return Err(VoxelizeError::GridMismatch("marker"));
        }
        if fields.markers.location() != location {
            return Err(VoxelizeError::LocationMismatch {
                field: "marker",
                expected: location,
                found: fields.markers.location(),
            });
        }
        if let Some(velocity) = fields.velocity.as_deref() {
            if *velocity.grid() != self.grid {
                return Err(VoxelizeError::GridMismatch("velocity"));
            }
            if velocity.location() != location {
                return Err(VoxelizeError::LocationMismatch {
                    field: "velocity",
                    expected: location,
                    found: velocity.location(),
                });
            }
        }
        Ok(())
    }
}

/// Session state before any mesh has been added.
#[derive(Debug)]
pub struct Unseeded;

/// Session state once at least one mesh has been added.
#[derive(Debug)]
pub struct Seeded;

/// A voxelization in progress.
///
/// Holds the bound fields until [`finalize`](VoxelizeSession::finalize),
/// which is only available once a mesh has been added.
#[derive(Debug)]
pub struct VoxelizeSession<'a, State> {
    voxelizer: Voxelizer,
    fields: VoxelFields<'a>,
    meshes: usize,
    _state: PhantomData<State>,
}

impl<'a, State> VoxelizeSession<'a, State> {
    /// Scan-convert `mesh` into the bound fields.
    ///
    /// Samples keep whichever mesh's plane offset is smallest in magnitude,
    /// so several meshes can be combined before finalizing. A mesh with
    /// fewer than three vertices resets the distance field to
    /// [`FAR_DISTANCE`] and leaves markers and velocities alone; samples
    /// marked by earlier meshes then hold the sentinel and are reported as
    /// far by [`finalize`](VoxelizeSession::finalize).
    ///
    /// The mesh is validated first; on error the session is dropped and the
    /// fields keep what earlier meshes wrote.
    pub fn add_mesh(mut self, mesh: &TriangleMesh) -> Result<VoxelizeSession<'a, Seeded>> {
        mesh.validate()?;

        if mesh.num_vertices() < 3 {
            debug!(
                vertices = mesh.num_vertices(),
                "mesh too small, resetting distance field"
            );
            self.fields.distance.fill(FAR_DISTANCE);
        } else {
            let stats = rasterize::rasterize_mesh(
                &self.voxelizer.grid,
                self.voxelizer.settings.epsilon,
                &mut self.fields,
                mesh,
            );
            debug!(
                mesh = self.meshes,
                triangles = mesh.triangle_count(),
                skipped = stats.skipped,
                lines = stats.lines,
                writes = stats.writes,
                "scan-converted mesh"
            );
        }

        Ok(VoxelizeSession {
            voxelizer: self.voxelizer,
            fields: self.fields,
            meshes: self.meshes + 1,
            _state: PhantomData,
        })
    }

    /// Number of meshes added so far.
    pub fn meshes(&self) -> usize {
        self.meshes
    }

    /// The voxelizer running this session.
    pub fn voxelizer(&self) -> &Voxelizer {
        &self.voxelizer
    }

    /// Current distances, in cells until finalized.
    pub fn distance(&self) -> &ScalarField {
        &*self.fields.distance
    }

    /// Current markers.
    pub fn markers(&self) -> &MarkerField {
        &*self.fields.markers
    }
}

impl<'a> VoxelizeSession<'a, Seeded> {
    /// Fill the narrow band and release the fields.
    ///
    /// Runs fast marching inside then outside, converts resolved distances
    /// from cells to world units and records their range on the distance
    /// field.
    pub fn finalize(self) -> VoxelizeReport {
        let VoxelizeSession {
            voxelizer,
            mut fields,
            meshes,
            ..
        } = self;
        let h = voxelizer.cell_size;
        let settings = voxelizer.settings;

        let march = fmm::march(&mut fields, settings.neg_range / h, settings.pos_range / h);
        debug!(
            seeded_negative = march.seeded_negative,
            seeded_positive = march.seeded_positive,
            solved = march.solved,
            pushed = march.pushed,
            "fast marching finished"
        );

        fields
            .distance
            .data_mut()
            .par_iter_mut()
            .zip(fields.markers.data().par_iter())
            .for_each(|(value, marker)| {
                if marker.is_resolved() && value.abs() < FAR_DISTANCE {
                    *value *= h;
                }
            });

        let range = finite_range(
            fields
                .distance
                .data()
                .iter()
                .zip(fields.markers.data())
                .filter(|(v, m)| m.is_resolved() && v.abs() < FAR_DISTANCE)
                .map(|(v, _)| *v),
        );
        fields.distance.set_range(range);

        // A sample counts as resolved only while it still holds a distance
        let holding = |marker: Marker| {
            fields
                .markers
                .data()
                .iter()
                .zip(fields.distance.data())
                .filter(|&(&m, &v)| m == marker && v.abs() < FAR_DISTANCE)
                .count()
        };
        let interface = holding(Marker::Interface);
        let updated = holding(Marker::Updated);
        let report = VoxelizeReport {
            meshes,
            interface,
            updated,
            far: fields.distance.len() - interface - updated,
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
        };

        info!(
            meshes = report.meshes,
            interface = report.interface,
            updated = report.updated,
            far = report.far,
            min = ?report.min,
            max = ?report.max,
            "voxelization finished"
        );

        report
    }
}
