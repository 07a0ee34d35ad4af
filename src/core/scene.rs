//! Scene serialization and deserialization
//!
//! Persists the per-entity properties the simulation owns (position,
//! queued path, target handle, operational radius) in RON or JSON.
//! Behavioral state is deliberately not saved; a loaded stalker starts
//! over in Idle and re-perceives the world.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ai::{StalkerBrain, spawn_stalker};
use crate::ecs::{Agent, Name, OperationalRadius, Transform, World};
use crate::voxel::{Coord, GridHandle};

/// A serializable entity with its components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEntity {
    /// Optional entity name
    pub name: Option<String>,
    /// Transform component
    pub transform: Transform,
    /// Agent component, if the entity is perceivable
    pub agent: Option<Agent>,
    /// Stalker-specific properties, if the entity is a stalker
    pub stalker: Option<StalkerRecord>,
}

/// Persisted stalker properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StalkerRecord {
    /// Suspension distance
    pub operational_radius: f32,
    /// Queued override path
    pub path: Vec<Coord>,
    /// Index of the target entity within the scene, if any
    pub target_index: Option<usize>,
}

/// A serializable scene containing multiple entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Scene version for compatibility
    pub version: u32,
    /// All entities in the scene
    pub entities: Vec<SerializedEntity>,
}

impl Scene {
    /// Create a new empty scene
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            entities: Vec::new(),
        }
    }

    /// Capture every transform-bearing entity in the world.
    ///
    /// Target handles become scene-local indices so they survive the round
    /// trip through a fresh world.
    #[must_use]
    pub fn capture(name: impl Into<String>, world: &World) -> Self {
        let mut scene = Self::new(name);
        let mut index_of = FxHashMap::default();

        for (entity, (transform, name, agent, brain, radius)) in world
            .query::<(
                &Transform,
                Option<&Name>,
                Option<&Agent>,
                Option<&StalkerBrain>,
                Option<&OperationalRadius>,
            )>()
            .iter()
        {
            index_of.insert(entity, scene.entities.len());
            scene.entities.push(SerializedEntity {
                name: name.map(|n| n.0.clone()),
                transform: *transform,
                agent: agent.copied(),
                stalker: brain.map(|brain| StalkerRecord {
                    operational_radius: radius.map_or_else(
                        || OperationalRadius::default().0,
                        |r| r.0,
                    ),
                    path: brain.ctx.chase.override_path.iter().copied().collect(),
                    // Filled below once every entity has an index.
                    target_index: None,
                }),
            });
        }

        for (entity, brain) in world.query::<&StalkerBrain>().iter() {
            let Some(&index) = index_of.get(&entity) else {
                continue;
            };
            if let Some(record) = scene.entities[index].stalker.as_mut() {
                record.target_index = brain
                    .target
                    .and_then(|target| index_of.get(&target).copied());
            }
        }

        scene
    }

    /// Spawn the scene's entities into a world.
    ///
    /// Stalkers are attached to `grid`; target indices are remapped to the
    /// freshly spawned entities.
    pub fn instantiate(&self, world: &mut World, grid: GridHandle) -> Vec<hecs::Entity> {
        let mut spawned = Vec::with_capacity(self.entities.len());

        for record in &self.entities {
            let entity = if record.stalker.is_some() {
                let start = Coord::from_world(record.transform.position);
                spawn_stalker(world, grid, start)
            } else if let Some(agent) = record.agent {
                world.spawn((record.transform, agent))
            } else {
                world.spawn((record.transform,))
            };

            if let Some(name) = &record.name {
                let _ = world.attach(entity, Name::new(name.clone()));
            }
            spawned.push(entity);
        }

        for (record, &entity) in self.entities.iter().zip(&spawned) {
            let Some(stalker) = &record.stalker else {
                continue;
            };
            if let Ok(mut radius) = world.get_mut::<OperationalRadius>(entity) {
                radius.0 = stalker.operational_radius;
            }
            if let Ok(mut transform) = world.get_mut::<Transform>(entity) {
                *transform = record.transform;
            }
            if let Ok(mut brain) = world.get_mut::<StalkerBrain>(entity) {
                brain.ctx.chase.override_path = stalker.path.iter().copied().collect();
                brain.target = stalker
                    .target_index
                    .and_then(|index| spawned.get(index).copied());
            }
        }

        spawned
    }

    /// Save the scene to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Serialize(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| SceneError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a scene from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| SceneError::Deserialize(e.to_string()))
    }

    /// Save the scene to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let json_string =
            serde_json::to_string_pretty(self).map_err(|e| SceneError::Serialize(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| SceneError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a scene from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SceneError::Deserialize(e.to_string()))
    }
}

/// Errors from scene persistence
#[derive(Debug, Clone)]
pub enum SceneError {
    /// Filesystem failure
    Io(String),
    /// Serialization failure
    Serialize(String),
    /// Deserialization failure
    Deserialize(String),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "scene io error: {msg}"),
            Self::Serialize(msg) => write!(f, "scene serialize error: {msg}"),
            Self::Deserialize(msg) => write!(f, "scene deserialize error: {msg}"),
        }
    }
}

impl std::error::Error for SceneError {}
