//! Proximity perception queries
//!
//! Agents are sampled once per tick into plain snapshots; queries run over
//! the snapshot slice so behavior tasks never need the live ECS world.

use glam::Vec3;
use hecs::Entity;

use crate::ecs::{Agent, Faction, Transform, World};

/// Flat copy of an agent's perceivable state for one tick
#[derive(Debug, Clone, Copy)]
pub struct AgentSnapshot {
    /// Handle back into the world
    pub entity: Entity,
    /// World-space position
    pub position: Vec3,
    /// Perception faction
    pub faction: Faction,
    /// Health at snapshot time
    pub health: f32,
    /// Suspended agents are invisible to queries
    pub suspended: bool,
}

impl AgentSnapshot {
    /// Whether this agent can be perceived at all
    #[must_use]
    pub fn perceivable(&self) -> bool {
        !self.suspended && self.health > 0.0
    }
}

/// Copy every agent in the world into `out`
pub fn collect_agents(world: &World, out: &mut Vec<AgentSnapshot>) {
    out.clear();
    for (entity, (agent, transform)) in world.query::<(&Agent, &Transform)>().iter() {
        out.push(AgentSnapshot {
            entity,
            position: transform.position,
            faction: agent.faction,
            health: agent.health,
            suspended: agent.suspended,
        });
    }
}

/// Find the nearest perceivable agent of `faction` within `radius` of
/// `origin` and no more than `vertical_bound` above or below it.
#[must_use]
pub fn query_agents(
    agents: &[AgentSnapshot],
    origin: Vec3,
    radius: f32,
    vertical_bound: f32,
    faction: Faction,
) -> Option<AgentSnapshot> {
    let mut best: Option<(f32, AgentSnapshot)> = None;
    for agent in agents {
        if agent.faction != faction || !agent.perceivable() {
            continue;
        }
        if (agent.position.y - origin.y).abs() > vertical_bound {
            continue;
        }
        let dist = agent.position.distance(origin);
        if dist > radius {
            continue;
        }
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, *agent));
        }
    }
    best.map(|(_, agent)| agent)
}
