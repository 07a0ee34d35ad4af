//! Headless simulation harness
//!
//! Owns the world, voxel grids, clock, and event queue, and advances the
//! AI systems on a fixed tick. Rendering is optional and external; the
//! harness runs the same with or without a GPU attached.

use glam::Vec3;

use crate::ai::{update_stalker_presentation, update_stalkers};
use crate::core::{Events, Time};
use crate::ecs::World;
use crate::voxel::VoxelWorld;

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Title used in logs
    pub title: String,
    /// Fixed ticks per second
    pub tick_rate: u32,
    /// Initial camera position
    pub camera: Vec3,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            title: String::from("Simulation"),
            tick_rate: 60,
            camera: Vec3::ZERO,
        }
    }
}

impl SimConfig {
    /// Create a new config with a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the fixed tick rate
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the initial camera position
    #[must_use]
    pub fn with_camera(mut self, camera: Vec3) -> Self {
        self.camera = camera;
        self
    }
}

/// The running simulation
pub struct Simulation {
    /// ECS world
    pub world: World,
    /// Voxel grids
    pub voxels: VoxelWorld,
    /// Event queue
    pub events: Events,
    /// Fixed-step clock
    pub time: Time,
    /// Camera position driving suspension checks
    pub camera: Vec3,
}

impl Simulation {
    /// Create a simulation from a config
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        log::info!(
            "starting simulation '{}' at {} Hz",
            config.title,
            config.tick_rate
        );
        Self {
            world: World::new(),
            voxels: VoxelWorld::new(),
            events: Events::new(),
            time: Time::new(config.tick_rate),
            camera: config.camera,
        }
    }

    /// Feed real frame time in and run as many fixed steps as it covers.
    ///
    /// Returns the number of steps taken.
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        self.time.advance(frame_dt);
        let mut steps = 0;
        while self.time.consume_step() {
            let dt = self.time.fixed_step();
            self.step(dt);
            steps += 1;
        }
        steps
    }

    /// Run exactly one tick of `dt` seconds.
    ///
    /// Swaps the event buffers first, so events pushed by the previous
    /// tick are readable through [`Events::iter`] while this tick's land
    /// in the pending buffer.
    pub fn step(&mut self, dt: f32) {
        self.events.swap();
        update_stalkers(
            &mut self.world,
            &mut self.voxels,
            self.camera,
            &mut self.events,
            dt,
        );
        update_stalker_presentation(&mut self.world, dt);
    }
}
