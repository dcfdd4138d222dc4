//! BVH construction.
//!
//! Cells live in a flat arena and refer to each other by index. The tree is
//! built breadth-first: each cell is bisected along the longest axis of its
//! box and every triangle goes to each child whose box it touches, so a
//! triangle straddling the split appears on both sides.

use std::collections::VecDeque;

use distfield_math::Aabb3;
use distfield_mesh::TriangleSource;
use tracing::{debug, info};

use crate::{BvhParams, Result};

/// A cell of the hierarchy.
#[derive(Debug, Clone)]
pub struct BvhCell {
    /// Depth below the root (root is 0).
    pub level: u32,
    /// Index of the parent cell, `None` for the root.
    pub parent: Option<usize>,
    /// Indices of the two children, `None` for a leaf.
    pub children: Option<(usize, usize)>,
    /// Box covered by this cell.
    pub bounds: Aabb3,
    /// Triangles whose padded box touches `bounds`.
    ///
    /// Internal cells keep their list so overlap queries can stop early.
    pub triangles: Vec<usize>,
}

impl BvhCell {
    /// Whether this cell has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Bounding volume hierarchy over a triangle source.
#[derive(Debug, Clone)]
pub struct Bvh<S> {
    pub(crate) source: S,
    pub(crate) cells: Vec<BvhCell>,
    pub(crate) triangle_bounds: Vec<Aabb3>,
    params: BvhParams,
}

impl<S: TriangleSource> Bvh<S> {
    /// Build a hierarchy over `source`.
    ///
    /// A source without triangles yields a tree with a single empty root.
    pub fn build(source: S, params: &BvhParams) -> Result<Self> {
        params.validate()?;
        source.validate()?;

        let count = source.triangle_count();
        let triangle_bounds: Vec<Aabb3> = (0..count)
            .map(|tri| {
                let [a, b, c] = source.triangle(tri);
                let mut aabb = Aabb3::from_triangle(&a, &b, &c);
                aabb.pad(params.epsilon);
                aabb
            })
            .collect();

        let root = BvhCell {
            level: 0,
            parent: None,
            children: None,
            bounds: source.bounds(),
            triangles: (0..count).collect(),
        };

        let mut cells = vec![root];
        let mut queue = VecDeque::from([0usize]);

        while let Some(idx) = queue.pop_front() {
            let cell = &cells[idx];
            if cell.level >= params.max_level || cell.triangles.len() <= params.max_leaf_triangles {
                continue;
            }

            let level = cell.level + 1;
            let (lo, hi) = cell.bounds.split();
            let mut lo_tris = Vec::new();
            let mut hi_tris = Vec::new();
            for &tri in &cell.triangles {
                let tb = &triangle_bounds[tri];
                if lo.intersects(tb) {
                    lo_tris.push(tri);
                }
                if hi.intersects(tb) {
                    hi_tris.push(tri);
                }
            }

            let left = cells.len();
            let right = left + 1;
            cells.push(BvhCell {
                level,
                parent: Some(idx),
                children: None,
                bounds: lo,
                triangles: lo_tris,
            });
            cells.push(BvhCell {
                level,
                parent: Some(idx),
                children: None,
                bounds: hi,
                triangles: hi_tris,
            });
            cells[idx].children = Some((left, right));
            queue.push_back(left);
            queue.push_back(right);
        }

        let bvh = Self {
            source,
            cells,
            triangle_bounds,
            params: *params,
        };

        info!(
            triangles = count,
            cells = bvh.cells.len(),
            leaves = bvh.leaf_count(),
            depth = bvh.depth(),
            "built BVH"
        );
        debug!(
            references = bvh.leaf_references(),
            "BVH leaf triangle references"
        );

        Ok(bvh)
    }
}

impl<S> Bvh<S> {
    /// All cells, root first. Children always follow their parent.
    pub fn cells(&self) -> &[BvhCell] {
        &self.cells
    }

    /// The root cell.
    pub fn root(&self) -> &BvhCell {
        &self.cells[0]
    }

    /// Deepest level in the tree.
    pub fn depth(&self) -> u32 {
        self.cells.iter().map(|c| c.level).max().unwrap_or(0)
    }

    /// Number of leaf cells.
    pub fn leaf_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_leaf()).count()
    }

    /// Total length of all leaf triangle lists.
    fn leaf_references(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.is_leaf())
            .map(|c| c.triangles.len())
            .sum()
    }

    /// Number of triangles indexed.
    pub fn triangle_count(&self) -> usize {
        self.triangle_bounds.len()
    }

    /// Whether the tree indexes no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangle_bounds.is_empty()
    }

    /// Padded bounding box of triangle `tri`.
    pub fn triangle_bounds(&self, tri: usize) -> &Aabb3 {
        &self.triangle_bounds[tri]
    }

    /// The mesh this tree was built over.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Parameters used for the build.
    pub fn params(&self) -> &BvhParams {
        &self.params
    }

    /// Give back the mesh.
    pub fn into_source(self) -> S {
        self.source
    }
}
