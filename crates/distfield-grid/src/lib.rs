#![warn(missing_docs)]

//! Regular grids and the fields sampled on them.
//!
//! A [`Grid`] describes a box split into cells; a [`Field`] stores one value
//! per grid node or per cell center. Distance, velocity and marker fields
//! share a grid and a [`SampleLocation`] so they can be indexed in lockstep.

mod error;
mod field;
mod grid;

pub use error::{GridError, Result};
pub use field::{finite_range, Field, Marker, MarkerField, ScalarField, VectorField};
pub use grid::{face_neighbors, flat_index, unflatten, Grid, SampleLocation};
