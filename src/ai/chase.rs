//! Voxel-grid chase movement
//!
//! A kinematic agent that burrows through penetrable voxel cells toward a
//! target. Pathfinding is A* over the six face neighbors with a caller
//! supplied cell filter; movement is stepped one cell at a time so every
//! crossing can drive side effects (terrain conversion, sound cues) in the
//! system that owns the agent.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use glam::Vec3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::voxel::{CellState, Coord, GridHandle, VoxelGrid};

/// How the chase agent treats a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    /// The agent may move through this cell
    Penetrable,
    /// The agent routes around this cell
    Avoid,
}

/// Classifies cells for pathfinding and wandering
pub type CellFilter = fn(CellState) -> CellClass;

/// Ceiling on explored nodes per path query; the grid is unbounded
const MAX_EXPLORED: usize = 2048;

/// Ceiling on committed cell crossings in a single step call
const MAX_MOVES_PER_STEP: usize = 16;

/// Search radius when snapping an off-grid target to a penetrable cell
const GOAL_SNAP_RADIUS: i32 = 2;

/// A creature that moves through the voxel grid cell by cell.
///
/// Position interpolation is deliberately coarse: the agent accumulates a
/// travel budget of `speed` cells per second and commits whole-cell moves,
/// reporting each crossed coordinate to the caller.
#[derive(Debug, Clone)]
pub struct ChaseAgent {
    /// Grid the agent lives in, revalidated by the owning system
    pub grid: GridHandle,
    /// Cell currently occupied
    pub coord: Coord,
    /// Cell occupied before the last move
    pub last_coord: Coord,
    /// World-space position, snapped to cell centers as the agent moves
    pub position: Vec3,
    /// Movement speed in cells per second
    pub speed: f32,
    /// Gates all movement
    pub enable_movement: bool,
    /// Gates A* pathfinding; when false only the override path is consumed
    pub enable_pathfinding: bool,
    /// World-space chase target
    pub target: Option<Vec3>,
    /// Whether the target is actively pursued
    pub target_active: bool,
    /// Queued coordinate path that overrides pathfinding
    pub override_path: VecDeque<Coord>,
    filter: CellFilter,
    path: VecDeque<Coord>,
    path_goal: Option<Coord>,
    travel: f32,
    rng: WanderRng,
}

impl ChaseAgent {
    /// Create an agent at `start` on the given grid
    #[must_use]
    pub fn new(grid: GridHandle, start: Coord, filter: CellFilter) -> Self {
        let seed = (start.x as u32)
            .wrapping_mul(0x9e37_79b9)
            .wrapping_add(start.y as u32)
            .wrapping_mul(0x85eb_ca6b)
            .wrapping_add(start.z as u32)
            | 1;
        Self {
            grid,
            coord: start,
            last_coord: start,
            position: start.center(),
            speed: 0.0,
            enable_movement: true,
            enable_pathfinding: true,
            target: None,
            target_active: false,
            override_path: VecDeque::new(),
            filter,
            path: VecDeque::new(),
            path_goal: None,
            travel: 0.0,
            rng: WanderRng(seed),
        }
    }

    /// The cell filter this agent was created with
    #[must_use]
    pub fn filter(&self) -> CellFilter {
        self.filter
    }

    /// Teleport the agent to a coordinate, clearing any computed path
    pub fn snap_to(&mut self, coord: Coord) {
        self.coord = coord;
        self.last_coord = coord;
        self.position = coord.center();
        self.path.clear();
        self.path_goal = None;
    }

    /// Advance movement by `dt` seconds.
    ///
    /// Returns every coordinate the agent moved into this step, in order.
    pub fn step(&mut self, dt: f32, grid: &VoxelGrid) -> SmallVec<[Coord; 8]> {
        let mut moves = SmallVec::new();
        if !self.enable_movement || self.speed <= 0.0 {
            self.travel = 0.0;
            return moves;
        }
        self.travel += self.speed * dt;
        while self.travel >= 1.0 && moves.len() < MAX_MOVES_PER_STEP {
            self.travel -= 1.0;
            let Some(next) = self.next_coord(grid) else {
                self.travel = 0.0;
                break;
            };
            self.last_coord = self.coord;
            self.coord = next;
            self.position = next.center();
            moves.push(next);
        }
        moves
    }

    /// Pick the next cell to occupy
    fn next_coord(&mut self, grid: &VoxelGrid) -> Option<Coord> {
        if !self.enable_pathfinding {
            return self.override_path.pop_front();
        }
        if self.target_active {
            if let Some(target) = self.target {
                let near = Coord::from_world(target);
                if let Some(goal) = nearest_penetrable(grid, near, self.filter) {
                    if self.path_goal != Some(goal) || self.path.is_empty() {
                        self.path = find_path(grid, self.coord, goal, self.filter);
                        self.path_goal = Some(goal);
                    }
                    if let Some(next) = self.path.pop_front() {
                        return Some(next);
                    }
                }
            }
        }
        self.wander(grid)
    }

    /// Crawl to a pseudo-random penetrable neighbor
    fn wander(&mut self, grid: &VoxelGrid) -> Option<Coord> {
        let mut open: SmallVec<[Coord; 6]> = SmallVec::new();
        for neighbor in self.coord.neighbors() {
            if (self.filter)(grid.get(neighbor)) == CellClass::Penetrable {
                open.push(neighbor);
            }
        }
        if open.is_empty() {
            return None;
        }
        // Avoid immediately backtracking unless it is the only way out.
        if open.len() > 1 {
            if let Some(back) = open.iter().position(|&c| c == self.last_coord) {
                open.swap_remove(back);
            }
        }
        let pick = self.rng.next_u32() as usize % open.len();
        Some(open[pick])
    }
}

/// Snap a coordinate to the closest penetrable cell within
/// [`GOAL_SNAP_RADIUS`], preferring the coordinate itself.
fn nearest_penetrable(grid: &VoxelGrid, center: Coord, filter: CellFilter) -> Option<Coord> {
    if filter(grid.get(center)) == CellClass::Penetrable {
        return Some(center);
    }
    let mut best: Option<(i32, Coord)> = None;
    let r = GOAL_SNAP_RADIUS;
    for dx in -r..=r {
        for dy in -r..=r {
            for dz in -r..=r {
                let candidate = center.offset(dx, dy, dz);
                if filter(grid.get(candidate)) != CellClass::Penetrable {
                    continue;
                }
                let dist = center.manhattan(candidate);
                if best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, candidate));
                }
            }
        }
    }
    best.map(|(_, coord)| coord)
}

/// A* node for the priority queue
#[derive(Debug, Clone, Copy)]
struct Node {
    coord: Coord,
    f_cost: i32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other.f_cost.cmp(&self.f_cost)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path between two cells with A*.
///
/// The returned queue excludes `start`. Unreachable goals and searches that
/// exhaust the node budget return an empty queue.
#[must_use]
pub fn find_path(
    grid: &VoxelGrid,
    start: Coord,
    goal: Coord,
    filter: CellFilter,
) -> VecDeque<Coord> {
    if filter(grid.get(goal)) != CellClass::Penetrable {
        return VecDeque::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<Coord, Coord> = FxHashMap::default();
    let mut g_score: FxHashMap<Coord, i32> = FxHashMap::default();

    g_score.insert(start, 0);
    open_set.push(Node {
        coord: start,
        f_cost: start.manhattan(goal),
    });

    let mut explored = 0;
    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            let mut path = VecDeque::new();
            let mut cursor = goal;
            while cursor != start {
                path.push_front(cursor);
                cursor = came_from[&cursor];
            }
            return path;
        }

        explored += 1;
        if explored > MAX_EXPLORED {
            break;
        }

        let current_g = g_score[&current.coord];
        for neighbor in current.coord.neighbors() {
            if filter(grid.get(neighbor)) != CellClass::Penetrable {
                continue;
            }
            let tentative = current_g + 1;
            if tentative < g_score.get(&neighbor).copied().unwrap_or(i32::MAX) {
                came_from.insert(neighbor, current.coord);
                g_score.insert(neighbor, tentative);
                open_set.push(Node {
                    coord: neighbor,
                    f_cost: tentative + neighbor.manhattan(goal),
                });
            }
        }
    }

    VecDeque::new()
}

/// xorshift32, deterministic wander decisions for testing
#[derive(Debug, Clone)]
struct WanderRng(u32);

impl WanderRng {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}
