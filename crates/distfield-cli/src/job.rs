//! Job files: a grid, settings and the shapes to voxelize, in TOML.
//!
//! ```toml
//! [grid]
//! resolution = [40, 40, 40]
//! min = [-2.0, -2.0, -2.0]
//! cell_size = 0.1
//! location = "cell"
//!
//! [voxelize]
//! neg_range = 0.5
//! pos_range = 0.5
//!
//! [[shapes]]
//! kind = "sphere"
//! center = [0.0, 0.0, 0.0]
//! radius = 1.0
//! velocity = [0.0, 0.0, 1.0]
//! ```

use anyhow::{bail, Context, Result};
use distfield::prelude::*;
use serde::Deserialize;
use std::path::Path;

/// Grid section. Exactly one of `max` and `cell_size` must be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    pub resolution: [usize; 3],
    pub min: [f64; 3],
    #[serde(default)]
    pub max: Option<[f64; 3]>,
    #[serde(default)]
    pub cell_size: Option<f64>,
    #[serde(default)]
    pub location: SampleLocation,
}

impl GridConfig {
    pub fn build(&self) -> Result<Grid> {
        let min = Point3::from(self.min);
        let grid = match (self.max, self.cell_size) {
            (Some(max), None) => Grid::new(self.resolution, min, Point3::from(max))?,
            (None, Some(h)) => Grid::from_cell_size(self.resolution, min, h)?,
            (Some(_), Some(_)) => bail!("grid: give either `max` or `cell_size`, not both"),
            (None, None) => bail!("grid: one of `max` or `cell_size` is required"),
        };
        Ok(grid)
    }
}

/// One analytic shape, triangulated on load.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeConfig {
    Box {
        min: [f64; 3],
        max: [f64; 3],
        #[serde(default)]
        velocity: Option<[f64; 3]>,
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
        #[serde(default = "default_subdivisions")]
        subdivisions: u32,
        #[serde(default)]
        velocity: Option<[f64; 3]>,
    },
}

fn default_subdivisions() -> u32 {
    3
}

impl ShapeConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeConfig::Box { .. } => "box",
            ShapeConfig::Sphere { .. } => "sphere",
        }
    }

    pub fn to_mesh(&self) -> Result<TriangleMesh> {
        let (mesh, velocity) = match *self {
            ShapeConfig::Box { min, max, velocity } => {
                if (0..3).any(|a| max[a] <= min[a]) {
                    bail!("box: max {max:?} must exceed min {min:?} on every axis");
                }
                (make_box(Point3::from(min), Point3::from(max)), velocity)
            }
            ShapeConfig::Sphere {
                center,
                radius,
                subdivisions,
                velocity,
            } => {
                if !(radius > 0.0 && radius.is_finite()) {
                    bail!("sphere: radius must be positive, got {radius}");
                }
                if subdivisions > 6 {
                    bail!("sphere: at most 6 subdivisions, got {subdivisions}");
                }
                (make_icosphere(Point3::from(center), radius, subdivisions), velocity)
            }
        };
        Ok(match velocity {
            Some(v) => mesh.with_uniform_velocity(Vec3::from(v)),
            None => mesh,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub grid: GridConfig,
    #[serde(default)]
    pub voxelize: VoxelizeSettings,
    #[serde(default)]
    pub bvh: BvhParams,
    #[serde(default)]
    pub shapes: Vec<ShapeConfig>,
}

impl Job {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading job file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing job file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let job: Job = toml::from_str(text)?;
        job.voxelize.validate()?;
        job.bvh.validate()?;
        Ok(job)
    }

    pub fn meshes(&self) -> Result<Vec<TriangleMesh>> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, s)| s.to_mesh().with_context(|| format!("shape #{i}")))
            .collect()
    }
}

/// Parse `x,y,z` into a point.
pub fn parse_point(s: &str) -> std::result::Result<Point3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got `{s}`"));
    }
    let mut xyz = [0.0; 3];
    for (slot, part) in xyz.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate `{part}`: {e}"))?;
    }
    Ok(Point3::from(xyz))
}
