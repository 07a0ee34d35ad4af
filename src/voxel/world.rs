//! Grid ownership and weak handles

use serde::{Deserialize, Serialize};

use super::VoxelGrid;

/// Weak reference to a grid in a [`VoxelWorld`].
///
/// Handles carry a generation counter so a slot reused after removal never
/// resolves through a stale handle. A dead handle is not an error; every
/// consumer checks validity at the start of the operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridHandle {
    index: u32,
    generation: u32,
}

/// Owns all voxel grids in the simulation
#[derive(Debug, Default)]
pub struct VoxelWorld {
    slots: Vec<Slot>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    grid: Option<VoxelGrid>,
}

impl VoxelWorld {
    /// Create a world with no grids
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grid and return its handle
    pub fn insert(&mut self, grid: VoxelGrid) -> GridHandle {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.grid.is_none() {
                slot.grid = Some(grid);
                return GridHandle {
                    index: index as u32,
                    generation: slot.generation,
                };
            }
        }
        self.slots.push(Slot {
            generation: 0,
            grid: Some(grid),
        });
        GridHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Remove a grid, invalidating every copy of its handle
    pub fn remove(&mut self, handle: GridHandle) -> Option<VoxelGrid> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let grid = slot.grid.take();
        if grid.is_some() {
            slot.generation += 1;
        }
        grid
    }

    /// Resolve a handle to its grid, if it is still alive
    #[must_use]
    pub fn get(&self, handle: GridHandle) -> Option<&VoxelGrid> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.grid.as_ref()
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, handle: GridHandle) -> Option<&mut VoxelGrid> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.grid.as_mut()
    }

    /// Whether the handle still points at a live grid
    #[must_use]
    pub fn is_alive(&self, handle: GridHandle) -> bool {
        self.get(handle).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_resolves_while_alive() {
        let mut world = VoxelWorld::new();
        let handle = world.insert(VoxelGrid::new());
        assert!(world.is_alive(handle));
        assert!(world.get(handle).is_some());
    }

    #[test]
    fn test_removed_handle_never_resolves_again() {
        let mut world = VoxelWorld::new();
        let handle = world.insert(VoxelGrid::new());
        assert!(world.remove(handle).is_some());
        assert!(!world.is_alive(handle));

        // Slot reuse must not resurrect the old handle.
        let replacement = world.insert(VoxelGrid::new());
        assert!(!world.is_alive(handle));
        assert!(world.is_alive(replacement));
        assert_ne!(handle, replacement);
    }

    #[test]
    fn test_double_remove_is_none() {
        let mut world = VoxelWorld::new();
        let handle = world.insert(VoxelGrid::new());
        world.remove(handle);
        assert!(world.remove(handle).is_none());
    }
}
