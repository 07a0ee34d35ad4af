//! AI and navigation module
//!
//! Provides the interval-task state machine, voxel-grid chase movement,
//! perception queries, and the stalker behavior built on top of them.

mod chase;
mod machine;
mod perception;
mod stalker;

pub use chase::{CellClass, CellFilter, ChaseAgent, find_path};
pub use machine::{Machine, StateDef, Task};
pub use perception::{AgentSnapshot, collect_agents, query_agents};
pub use stalker::{
    StalkerBrain, StalkerCtx, StalkerState, TargetRequest, TargetSnapshot, burrow_filter,
    cage_path, spawn_stalker, update_stalker_presentation, update_stalkers,
};
