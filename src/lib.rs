//! Voxel-game creature AI and dynamic shadow lighting
//!
//! This crate provides:
//! - A finite-state enemy AI that hunts agents through a voxel grid
//! - A dynamic shadow-map and light aggregation manager over wgpu
//! - The substrate both need: a sparse voxel world, a thin hecs wrapper,
//!   an event queue, scene persistence, and a headless tick harness

pub mod ai;
pub mod audio;
pub mod core;
pub mod ecs;
pub mod renderer;
pub mod voxel;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use wgpu;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        ChaseAgent, StalkerBrain, StalkerState, spawn_stalker, update_stalker_presentation,
        update_stalkers,
    };
    pub use crate::core::{Events, GameEvent, Scene, SimConfig, Simulation, SoundCue, Time};
    pub use crate::ecs::{Agent, Faction, Name, OperationalRadius, Transform, World};
    pub use crate::renderer::{
        AmbientLight, Camera, DirectionalLight, LightSet, LightingManager, PointLight,
        ShadowQuality, SpotLight,
    };
    pub use crate::voxel::{CellState, Coord, GridHandle, VoxelGrid, VoxelWorld};
    pub use glam::{Mat4, Quat, Vec3, Vec4};
}
