//! distfield CLI - voxelize analytic shapes and query closest points.
//!
//! Every command reads a TOML job file describing the grid, settings and
//! shapes; see [`job`] for the format.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use distfield::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod job;

use job::{parse_point, Job};

#[derive(Parser)]
#[command(name = "distfield")]
#[command(about = "Narrow-band signed distance fields from triangle meshes", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Voxelize the job's shapes and print the report as JSON
    Voxelize {
        /// Job file (.toml)
        job: PathBuf,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write every field (distance, markers, velocity) as JSON
        #[arg(long)]
        dump_field: Option<PathBuf>,
    },
    /// Find the closest surface point to a query point
    Query {
        /// Job file (.toml)
        job: PathBuf,
        /// Query point as x,y,z
        #[arg(short, long, value_parser = parse_point, allow_hyphen_values = true)]
        point: Point3,
        /// Ignore surfaces at or beyond this distance
        #[arg(long, default_value_t = f64::INFINITY)]
        max_distance: f64,
        /// Also voxelize and report the interpolated field value
        #[arg(long)]
        sample: bool,
    },
    /// Describe the job's grid, shapes and BVH
    Info {
        /// Job file (.toml)
        job: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Voxelize {
            job,
            output,
            dump_field,
        } => voxelize(&job, output.as_deref(), dump_field.as_deref()),
        Commands::Query {
            job,
            point,
            max_distance,
            sample,
        } => query(&job, point, max_distance, sample),
        Commands::Info { job } => show_info(&job),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn voxelize_job(job: &Job) -> Result<DistanceField> {
    let grid = job.grid.build()?;
    let meshes = job.meshes()?;
    debug!(shapes = meshes.len(), "voxelizing job");
    let field = DistanceField::from_meshes(grid, job.grid.location, job.voxelize, &meshes)?;
    Ok(field)
}

fn voxelize(path: &Path, output: Option<&Path>, dump_field: Option<&Path>) -> Result<()> {
    let job = Job::load(path)?;
    let field = voxelize_job(&job)?;

    let report = serde_json::to_string_pretty(field.report())?;
    match output {
        Some(out) => {
            std::fs::write(out, report).with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), "wrote report");
        }
        None => println!("{report}"),
    }

    if let Some(out) = dump_field {
        let file = std::fs::File::create(out)
            .with_context(|| format!("creating {}", out.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), &field)?;
        info!(path = %out.display(), samples = field.distance().len(), "wrote fields");
    }
    Ok(())
}

#[derive(Serialize)]
struct QueryResult {
    point: Point3,
    hit: Option<ClosestHit>,
    /// Index of the job shape owning the hit triangle.
    shape: Option<usize>,
    /// Interpolated signed distance, when `--sample` was given.
    field: Option<f64>,
}

/// Merge all shapes into one mesh, remembering where each starts.
fn merged_mesh(meshes: &[TriangleMesh]) -> (TriangleMesh, Vec<usize>) {
    let mut merged = TriangleMesh::new();
    let mut starts = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        starts.push(merged.num_triangles());
        merged.merge(mesh);
    }
    (merged, starts)
}

/// Shape owning merged triangle `tri`.
fn owning_shape(starts: &[usize], tri: usize) -> Option<usize> {
    starts.iter().rposition(|&s| s <= tri)
}

fn query(path: &Path, point: Point3, max_distance: f64, sample: bool) -> Result<()> {
    let job = Job::load(path)?;
    let meshes = job.meshes()?;
    let (merged, starts) = merged_mesh(&meshes);
    let bvh = Bvh::build(merged, &job.bvh)?;

    let hit = bvh.closest_point(&point, max_distance);
    let field = if sample {
        Some(voxelize_job(&job)?.sample(&point))
    } else {
        None
    };
    let result = QueryResult {
        point,
        hit,
        shape: hit.and_then(|h| owning_shape(&starts, h.triangle)),
        field,
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    let job = Job::load(path)?;
    let grid = job.grid.build()?;
    let location = job.grid.location;
    let h = grid.cell_size();

    println!("distfield job: {}", path.display());
    println!("  Resolution: {:?}", grid.resolution());
    println!("  Bounds: {:?} .. {:?}", grid.min().coords.as_slice(), grid.max().coords.as_slice());
    println!("  Cell size: {} x {} x {}", h.x, h.y, h.z);
    println!("  Samples: {} ({:?})", grid.sample_count(location), location);
    if grid.uniform_cell_size(distfield::voxel::UNIFORM_CELL_TOLERANCE).is_none() {
        println!("  Warning: cells are not cubic, voxelization will fail");
    }
    println!(
        "  Band: -{} .. +{}",
        job.voxelize.neg_range, job.voxelize.pos_range
    );

    let meshes = job.meshes()?;
    println!("\nShapes:");
    for (i, (shape, mesh)) in job.shapes.iter().zip(&meshes).enumerate() {
        println!(
            "  {}: {} ({} triangles, {} vertices{})",
            i,
            shape.name(),
            mesh.num_triangles(),
            mesh.num_vertices(),
            if mesh.velocities.is_some() { ", moving" } else { "" }
        );
    }

    let (merged, _) = merged_mesh(&meshes);
    match Bvh::build(merged, &job.bvh) {
        Ok(bvh) => {
            println!("\nBVH:");
            println!("  Triangles: {}", bvh.triangle_count());
            println!("  Cells: {}", bvh.cells().len());
            println!("  Leaves: {}", bvh.leaf_count());
            println!("  Depth: {}", bvh.depth());
        }
        Err(e) => {
            println!("\nFailed to build BVH: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owning_shape() {
        let a = make_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = make_icosphere(Point3::new(3.0, 0.0, 0.0), 1.0, 0);
        let (merged, starts) = merged_mesh(&[a, b]);
        assert_eq!(starts, vec![0, 12]);
        assert_eq!(merged.num_triangles(), 32);
        assert_eq!(owning_shape(&starts, 0), Some(0));
        assert_eq!(owning_shape(&starts, 11), Some(0));
        assert_eq!(owning_shape(&starts, 12), Some(1));
        assert_eq!(owning_shape(&starts, 31), Some(1));
    }

    #[test]
    fn test_query_hits_the_right_shape() {
        let job = Job::parse(
            r#"
            [grid]
            resolution = [10, 10, 10]
            min = [-1.0, -1.0, -1.0]
            cell_size = 0.5

            [[shapes]]
            kind = "box"
            min = [-0.5, -0.5, -0.5]
            max = [0.5, 0.5, 0.5]

            [[shapes]]
            kind = "sphere"
            center = [3.0, 0.0, 0.0]
            radius = 0.5
            subdivisions = 1
            "#,
        )
        .unwrap();
        let meshes = job.meshes().unwrap();
        let (merged, starts) = merged_mesh(&meshes);
        let bvh = Bvh::build(merged, &job.bvh).unwrap();

        let hit = bvh.closest_point(&Point3::new(3.0, 0.0, 1.5), f64::INFINITY).unwrap();
        assert_eq!(owning_shape(&starts, hit.triangle), Some(1));
        let hit = bvh.closest_point(&Point3::new(0.0, 0.0, 1.5), f64::INFINITY).unwrap();
        assert_eq!(owning_shape(&starts, hit.triangle), Some(0));
        assert!((hit.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_voxelize_job() {
        let job = Job::parse(
            r#"
            [grid]
            resolution = [16, 16, 16]
            min = [-0.8, -0.8, -0.8]
            cell_size = 0.1

            [voxelize]
            neg_range = 0.3
            pos_range = 0.3

            [[shapes]]
            kind = "sphere"
            center = [0.0, 0.0, 0.0]
            radius = 0.5
            velocity = [0.0, 0.0, 2.0]
            "#,
        )
        .unwrap();
        let field = voxelize_job(&job).unwrap();
        assert!(field.report().interface > 0);
        assert!(field.sample(&Point3::new(0.0, 0.0, 0.45)) < 0.0);
        assert!(field.sample(&Point3::new(0.0, 0.0, 0.65)) > 0.0);

        let json = serde_json::to_value(field.report()).unwrap();
        assert_eq!(json["meshes"], 1);
    }
}
