//! Sparse voxel world representation
//!
//! Stores cell states for the chunked volumetric world the creatures crawl
//! through. Grids are owned by a [`VoxelWorld`] and referenced through
//! generation-checked [`GridHandle`]s, so a deleted grid is an ordinary
//! `None` branch for anyone still holding a handle.

mod coord;
mod grid;
mod world;

pub use coord::Coord;
pub use grid::{CellState, VoxelGrid};
pub use world::{GridHandle, VoxelWorld};
