//! Voxel grid storage and cell mutation

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::Coord;

/// State of a single voxel cell.
///
/// Unstored cells read as [`CellState::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Open air
    #[default]
    Empty,
    /// Ordinary terrain
    Neutral,
    /// Terrain converted by a creature passing through it
    Infected,
    /// Terrain no creature can burrow through
    Rock,
}

impl CellState {
    /// Whether the cell contains any terrain at all
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// A sparse voxel grid.
///
/// Mutations go through [`fill`](Self::fill) and [`empty`](Self::empty),
/// which report whether anything actually changed so callers can decide to
/// [`regenerate`](Self::regenerate). The revision counter stands in for the
/// host engine's remeshing step: render-side consumers compare revisions to
/// know when their derived data is stale.
#[derive(Debug, Clone, Default)]
pub struct VoxelGrid {
    cells: FxHashMap<Coord, CellState>,
    revision: u64,
}

impl VoxelGrid {
    /// Create an empty grid
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the cell at `coord`
    #[must_use]
    pub fn get(&self, coord: Coord) -> CellState {
        self.cells.get(&coord).copied().unwrap_or_default()
    }

    /// Set a cell to a non-empty state.
    ///
    /// Returns true if the cell changed.
    pub fn fill(&mut self, coord: Coord, state: CellState) -> bool {
        if state == CellState::Empty {
            return self.empty(coord);
        }
        if self.get(coord) == state {
            return false;
        }
        self.cells.insert(coord, state);
        true
    }

    /// Clear a cell back to empty.
    ///
    /// Returns true if the cell changed.
    pub fn empty(&mut self, coord: Coord) -> bool {
        self.cells.remove(&coord).is_some()
    }

    /// Fill an axis-aligned box of cells, inclusive on both corners
    pub fn fill_box(&mut self, min: Coord, max: Coord, state: CellState) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.fill(Coord::new(x, y, z), state);
                }
            }
        }
    }

    /// Mark derived data (meshes, collision) stale after a batch of edits
    pub fn regenerate(&mut self) {
        self.revision += 1;
    }

    /// Current remesh revision
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of non-empty cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no stored cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
