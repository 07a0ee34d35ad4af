//! Light records
//!
//! Lights are plain data owned by a [`LightSet`]; the lighting manager
//! only reads and ranks them each frame. Every record carries the
//! enabled/suspended/shadowed flags the per-frame aggregation filters on.

use glam::{Mat4, Quat, Vec3};

use crate::ecs::World;

/// Parallel-ray light, like the sun
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Normalized light direction
    pub direction: Vec3,
    /// Light color; components above 1.0 over-brighten
    pub color: Vec3,
    /// Disabled lights are skipped entirely
    pub enabled: bool,
    /// Suspended lights are skipped without being disabled
    pub suspended: bool,
    /// Whether this light may cast the global shadow
    pub shadowed: bool,
}

impl DirectionalLight {
    /// Create an enabled, non-shadowed directional light
    #[must_use]
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            enabled: true,
            suspended: false,
            shadowed: false,
        }
    }

    /// Mark as the shadow-casting candidate
    #[must_use]
    pub fn with_shadow(mut self) -> Self {
        self.shadowed = true;
        self
    }
}

/// Flat additive light with no position
#[derive(Debug, Clone)]
pub struct AmbientLight {
    /// Contribution color
    pub color: Vec3,
    /// Disabled lights contribute nothing
    pub enabled: bool,
}

impl AmbientLight {
    /// Create an enabled ambient light
    #[must_use]
    pub fn new(color: Vec3) -> Self {
        Self {
            color,
            enabled: true,
        }
    }
}

/// Omnidirectional light with a finite radius.
///
/// Also usable directly as an ECS component for entity-attached lights.
#[derive(Debug, Clone)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Light color
    pub color: Vec3,
    /// Radius of influence; zero or negative disables shadow eligibility
    pub attenuation: f32,
    /// Disabled lights are skipped entirely
    pub enabled: bool,
    /// Suspended lights are skipped without being disabled
    pub suspended: bool,
    /// Whether this light wants a shadow pass
    pub shadowed: bool,
}

impl PointLight {
    /// Create an enabled point light
    #[must_use]
    pub fn new(position: Vec3, color: Vec3, attenuation: f32) -> Self {
        Self {
            position,
            color,
            attenuation,
            enabled: true,
            suspended: false,
            shadowed: false,
        }
    }
}

/// Cone light with a perspective shadow projection
#[derive(Debug, Clone)]
pub struct SpotLight {
    /// World position
    pub position: Vec3,
    /// Orientation; the cone points along local -Z
    pub orientation: Quat,
    /// Light color
    pub color: Vec3,
    /// Cone reach in world units
    pub attenuation: f32,
    /// Full cone angle in radians
    pub fov: f32,
    /// Depth bias applied when sampling this light's shadow map
    pub shadow_bias: f32,
    /// Disabled lights are skipped entirely
    pub enabled: bool,
    /// Suspended lights are skipped without being disabled
    pub suspended: bool,
    /// Whether this light competes for a shadow map slot
    pub shadowed: bool,
}

impl SpotLight {
    /// Create an enabled spot light aimed along `direction`
    #[must_use]
    pub fn new(position: Vec3, direction: Vec3, color: Vec3, attenuation: f32) -> Self {
        Self {
            position,
            orientation: Quat::from_rotation_arc(Vec3::NEG_Z, direction.normalize()),
            color,
            attenuation,
            fov: 60.0_f32.to_radians(),
            shadow_bias: 0.005,
            enabled: true,
            suspended: false,
            shadowed: false,
        }
    }

    /// Mark as wanting a shadow map
    #[must_use]
    pub fn with_shadow(mut self) -> Self {
        self.shadowed = true;
        self
    }

    /// The cone's world-space direction
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// View matrix from the light's point of view
    #[must_use]
    pub fn view(&self) -> Mat4 {
        let direction = self.direction();
        let up = if direction.y.abs() > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.position + direction, up)
    }

    /// Square perspective projection covering the cone.
    ///
    /// The far plane never drops below 2.0 so a nearly dead light still
    /// produces a valid projection.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, 1.0, 1.0, self.attenuation.max(2.0))
    }

    /// Combined view-projection for the shadow pass
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// All lights visible to the renderer this frame.
///
/// Rebuilt as scratch state rather than treated as a registry: callers
/// clear and repopulate it per frame or mutate records in place.
#[derive(Debug, Default)]
pub struct LightSet {
    /// Directional lights
    pub directional: Vec<DirectionalLight>,
    /// Ambient lights
    pub ambient: Vec<AmbientLight>,
    /// Point lights
    pub point: Vec<PointLight>,
    /// Spot lights
    pub spot: Vec<SpotLight>,
}

impl LightSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all lights
    pub fn clear(&mut self) {
        self.directional.clear();
        self.ambient.clear();
        self.point.clear();
        self.spot.clear();
    }

    /// Total number of lights
    #[must_use]
    pub fn len(&self) -> usize {
        self.directional.len() + self.ambient.len() + self.point.len() + self.spot.len()
    }

    /// Whether the set holds no lights
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every entity-attached point light into this set.
    ///
    /// Call after clearing to rebuild the frame's working set.
    pub fn gather_point_lights(&mut self, world: &World) {
        for (_entity, light) in world.query::<&PointLight>().iter() {
            self.point.push(light.clone());
        }
    }
}
