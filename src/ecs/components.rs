//! Common ECS components

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component for position, rotation, and scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Transform {
    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Distance to another world-space point
    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Which side an agent belongs to, used by perception filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Creature,
}

/// A perceivable, damageable participant in the simulation.
///
/// Health is normalized to `0.0..=1.0`; an agent at zero health is inactive
/// and invisible to perception queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Agent {
    /// Remaining health, `1.0` when unharmed
    pub health: f32,
    /// Perception faction
    pub faction: Faction,
    /// Suspended agents are skipped by perception queries
    pub suspended: bool,
}

impl Agent {
    /// Create a full-health agent of the given faction
    #[must_use]
    pub const fn new(faction: Faction) -> Self {
        Self {
            health: 1.0,
            faction,
            suspended: false,
        }
    }

    /// Whether the agent still counts as active
    #[must_use]
    pub fn alive(&self) -> bool {
        self.health > 0.0
    }

    /// Apply damage, clamping health at zero
    pub fn damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

/// Distance from the camera beyond which an entity's behavior is suspended
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OperationalRadius(pub f32);

impl Default for OperationalRadius {
    fn default() -> Self {
        Self(100.0)
    }
}
