//! Dynamic shadow and light aggregation
//!
//! Per-frame owner of everything the lighting pass consumes: the bounded
//! directional/ambient aggregates, the specular material table, the spot
//! shadow map assignment, and the two-cascade global shadow map. The
//! manager reads lights, it never owns them; all of its aggregate state is
//! scratch rebuilt each frame.
//!
//! Light selection and ranking are pure and run without a GPU; the render
//! entry points take the device, an encoder, and a host-supplied scene
//! callback for the depth-only passes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::camera::Camera;
use super::lights::{LightSet, PointLight, SpotLight};
use super::material::{MAX_MATERIALS, Material, MaterialTable};
use super::shadow::{ShadowTarget, comparison_sampler, uniform_buffer};

/// Directional lights published to the lighting pass
pub const MAX_DIRECTIONAL_LIGHTS: usize = 3;

/// Spot shadow scores at or above this are not worth a map
const LIGHT_SHADOW_THRESHOLD: f32 = 60.0;

/// Snap interval for the wide cascade's focus point
const GLOBAL_SHADOW_FOCUS_INTERVAL: f32 = 10.0;

/// Snap interval for the detail cascade's focus point
const DETAIL_SHADOW_FOCUS_INTERVAL: f32 = 1.0;

/// Detail cascade coverage as a fraction of the wide cascade
const DETAIL_SHADOW_SIZE_RATIO: f32 = 0.15;

/// Discrete shadow quality setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowQuality {
    /// No shadow maps at all
    #[default]
    Off,
    Low,
    Medium,
    High,
    Ultra,
}

/// Resolutions and limits implied by a quality setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityProfile {
    /// Whether the global cascades exist at all
    pub global_shadow_map: bool,
    /// Wide cascade resolution
    pub global_size: u32,
    /// Detail cascade resolution
    pub detail_size: u32,
    /// Per-spot shadow map resolution
    pub spot_size: u32,
    /// Concurrently shadowed spot lights
    pub max_shadowed_spot_lights: usize,
}

impl ShadowQuality {
    /// The resolution/limit table for this setting
    #[must_use]
    pub const fn profile(self) -> QualityProfile {
        match self {
            Self::Off => QualityProfile {
                global_shadow_map: false,
                global_size: 0,
                detail_size: 0,
                spot_size: 0,
                max_shadowed_spot_lights: 0,
            },
            Self::Low => QualityProfile {
                global_shadow_map: true,
                global_size: 1024,
                detail_size: 512,
                spot_size: 256,
                max_shadowed_spot_lights: 1,
            },
            Self::Medium => QualityProfile {
                global_shadow_map: true,
                global_size: 1024,
                detail_size: 1024,
                spot_size: 512,
                max_shadowed_spot_lights: 1,
            },
            Self::High => QualityProfile {
                global_shadow_map: true,
                global_size: 2048,
                detail_size: 1024,
                spot_size: 512,
                max_shadowed_spot_lights: 2,
            },
            Self::Ultra => QualityProfile {
                global_shadow_map: true,
                global_size: 2048,
                detail_size: 2048,
                spot_size: 1024,
                max_shadowed_spot_lights: 3,
            },
        }
    }
}

/// Directional, ambient, and global-shadow data for the lighting pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalLightParams {
    /// Directional light directions, w unused
    pub directional_directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Directional light colors, w unused; slot 0 is the shadow caster
    pub directional_colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Summed ambient color, w unused
    pub ambient_color: [f32; 4],
    /// Camera-relative wide cascade matrix
    pub shadow_view_projection: [[f32; 4]; 4],
    /// Camera-relative detail cascade matrix
    pub detail_shadow_view_projection: [[f32; 4]; 4],
    /// Wide cascade resolution
    pub shadow_map_size: f32,
    /// Detail cascade resolution
    pub detail_shadow_map_size: f32,
    _padding: [f32; 2],
}

/// Packed specular table, vec2 entries padded to std140 stride
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialParams {
    /// (specular power, specular intensity) pairs
    pub materials: [[f32; 4]; MAX_MATERIALS],
}

/// Per-spot-light data for the lighting pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpotLightParams {
    /// Camera-relative shadow matrix
    pub view_projection: [[f32; 4]; 4],
    /// Camera-relative cone volume transform
    pub world: [[f32; 4]; 4],
    /// Camera-relative light position
    pub position: [f32; 3],
    /// Cone depth reach
    pub radius: f32,
    /// Cone direction
    pub direction: [f32; 3],
    /// 1 when a shadow map slot is assigned this frame
    pub shadowed: u32,
    /// Light color
    pub color: [f32; 3],
    /// Depth bias for shadow sampling
    pub shadow_bias: f32,
    /// Assigned shadow map resolution, 0 when unshadowed
    pub shadow_map_size: f32,
    _padding: [f32; 3],
}

/// Per-point-light data for the lighting pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PointLightParams {
    /// Camera-relative sphere volume transform
    pub world: [[f32; 4]; 4],
    /// Camera-relative light position
    pub position: [f32; 3],
    /// Radius of influence
    pub radius: f32,
    /// Light color
    pub color: [f32; 3],
    _padding: f32,
}

/// GPU resources for the current quality setting
struct ShadowTargets {
    global: Option<ShadowTarget>,
    detail: Option<ShadowTarget>,
    spots: Vec<ShadowTarget>,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
}

/// Aggregates lights and owns the shadow map passes for one scene.
///
/// Pass the manager explicitly to render call sites; it is deliberately
/// not a process-wide singleton.
pub struct LightingManager {
    quality: ShadowQuality,
    profile: QualityProfile,
    directional_directions: [Vec3; MAX_DIRECTIONAL_LIGHTS],
    directional_colors: [Vec3; MAX_DIRECTIONAL_LIGHTS],
    ambient: Vec3,
    global_shadow_light: Option<Vec3>,
    materials: MaterialTable,
    shadow_indices: FxHashMap<usize, usize>,
    global_view_projection: Mat4,
    detail_view_projection: Mat4,
    global_rendered_last_frame: bool,
    targets: Option<ShadowTargets>,
}

impl LightingManager {
    /// Create a manager with shadows off
    #[must_use]
    pub fn new() -> Self {
        Self {
            quality: ShadowQuality::Off,
            profile: ShadowQuality::Off.profile(),
            directional_directions: [Vec3::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directional_colors: [Vec3::ZERO; MAX_DIRECTIONAL_LIGHTS],
            ambient: Vec3::ZERO,
            global_shadow_light: None,
            materials: MaterialTable::new(),
            shadow_indices: FxHashMap::default(),
            global_view_projection: Mat4::IDENTITY,
            detail_view_projection: Mat4::IDENTITY,
            global_rendered_last_frame: false,
            targets: None,
        }
    }

    /// Current quality setting
    #[must_use]
    pub fn quality(&self) -> ShadowQuality {
        self.quality
    }

    /// Limits implied by the current setting
    #[must_use]
    pub fn profile(&self) -> QualityProfile {
        self.profile
    }

    /// Change the quality setting.
    ///
    /// Disposes every render target immediately; the next render pass
    /// reallocates at the new resolutions.
    pub fn set_quality(&mut self, quality: ShadowQuality) {
        log::info!("shadow quality -> {quality:?}");
        self.shadow_indices.clear();
        self.targets = None;
        self.quality = quality;
        self.profile = quality.profile();
    }

    /// Whether a shadow-casting directional light was designated this frame
    #[must_use]
    pub fn has_global_shadow_light(&self) -> bool {
        self.global_shadow_light.is_some()
    }

    /// Summed ambient color
    #[must_use]
    pub fn ambient_color(&self) -> Vec3 {
        self.ambient
    }

    /// Register a material for this frame and get its table index
    pub fn material_index(&mut self, material: Material) -> usize {
        self.materials.index_of(material)
    }

    /// Shadow map slot assigned to a spot light this frame, if any
    #[must_use]
    pub fn spot_shadow_slot(&self, light_index: usize) -> Option<usize> {
        self.shadow_indices.get(&light_index).copied()
    }

    /// Aggregate directional and ambient lights for the frame.
    ///
    /// Keeps at most [`MAX_DIRECTIONAL_LIGHTS`] enabled directional
    /// lights; the first shadow-casting one becomes the global shadow
    /// light and is swapped into slot 0. Also flushes the material table
    /// registered by the previous frame's draw calls.
    pub fn update_global_lights(&mut self, lights: &LightSet) {
        self.materials.flush();

        self.global_shadow_light = None;
        let mut index = 0;
        for light in lights
            .directional
            .iter()
            .filter(|l| l.enabled && !l.suspended)
            .take(MAX_DIRECTIONAL_LIGHTS)
        {
            let mut slot = index;
            if light.shadowed && self.global_shadow_light.is_none() {
                // By convention slot 0 is the shadow caster; whoever was
                // there moves into this light's slot.
                self.directional_directions[index] = self.directional_directions[0];
                self.directional_colors[index] = self.directional_colors[0];
                slot = 0;
                self.global_shadow_light = Some(light.direction);
            }
            self.directional_directions[slot] = light.direction;
            self.directional_colors[slot] = light.color;
            index += 1;
        }
        while index < MAX_DIRECTIONAL_LIGHTS {
            self.directional_colors[index] = Vec3::ZERO;
            index += 1;
        }

        self.ambient = Vec3::ZERO;
        for light in lights.ambient.iter().filter(|l| l.enabled) {
            self.ambient += light.color;
        }
    }

    /// Rank shadow-worthy spot lights for this camera.
    ///
    /// Returns indices into `lights.spot`, most important first, at most
    /// the per-quality cap. Pure: identical input yields identical output.
    #[must_use]
    pub fn select_spot_shadows(
        &self,
        lights: &LightSet,
        camera: &Camera,
    ) -> SmallVec<[usize; 4]> {
        let frustum = camera.frustum();
        let mut candidates: SmallVec<[(usize, f32); 8]> = SmallVec::new();
        for (index, light) in lights.spot.iter().enumerate() {
            if !light.enabled || light.suspended || !light.shadowed || light.attenuation <= 0.0 {
                continue;
            }
            if !frustum.intersects_sphere(light.position, light.attenuation) {
                continue;
            }
            let score = light.position.distance_squared(camera.position) / light.attenuation;
            if score < LIGHT_SHADOW_THRESHOLD {
                candidates.push((index, score));
            }
        }
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(self.profile.max_shadowed_spot_lights);
        candidates.into_iter().map(|(index, _)| index).collect()
    }

    /// Select spot lights and record their shadow map slots.
    ///
    /// The index map is scratch state: cleared and rebuilt on every call.
    pub fn assign_spot_shadows(
        &mut self,
        lights: &LightSet,
        camera: &Camera,
    ) -> SmallVec<[usize; 4]> {
        let selected = self.select_spot_shadows(lights, camera);
        self.shadow_indices.clear();
        for (slot, &light_index) in selected.iter().enumerate() {
            self.shadow_indices.insert(light_index, slot);
        }
        selected
    }

    /// Render every shadow map due this frame.
    ///
    /// Spot passes come first, then the global cascades when a global
    /// shadow light exists. `draw_scene` receives each depth pass and the
    /// light's view-projection matrix.
    pub fn render_shadow_maps<F>(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        camera: &Camera,
        lights: &LightSet,
        mut draw_scene: F,
    ) where
        F: FnMut(&mut wgpu::RenderPass<'_>, Mat4),
    {
        self.ensure_targets(device);
        let selected = self.assign_spot_shadows(lights, camera);

        if let Some(targets) = &self.targets {
            for (slot, &light_index) in selected.iter().enumerate() {
                let Some(target) = targets.spots.get(slot) else {
                    break;
                };
                let view_projection = lights.spot[light_index].view_projection();
                let mut pass = target.begin_depth_pass(encoder, "spot_shadow_pass");
                draw_scene(&mut pass, view_projection);
            }
        }

        if self.profile.global_shadow_map && self.global_shadow_light.is_some() {
            self.render_global_shadow_map(encoder, camera, &mut draw_scene);
        }
    }

    /// Render the two global cascades.
    ///
    /// The wide cascade renders on alternating invocations only and snaps
    /// its focus to a coarse interval; the detail cascade renders every
    /// invocation on a fine interval. Both are orthographic, centered on
    /// the snapped camera position pushed back along the light direction
    /// by the camera's far-plane distance.
    fn render_global_shadow_map<F>(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        camera: &Camera,
        draw_scene: &mut F,
    ) where
        F: FnMut(&mut wgpu::RenderPass<'_>, Mat4),
    {
        let Some(direction) = self.global_shadow_light else {
            return;
        };

        if self.take_coarse_turn() {
            let view_projection =
                cascade_matrix(camera, direction, GLOBAL_SHADOW_FOCUS_INTERVAL, camera.far);
            if let Some(target) = self.targets.as_ref().and_then(|t| t.global.as_ref()) {
                let mut pass = target.begin_depth_pass(encoder, "global_shadow_pass");
                draw_scene(&mut pass, view_projection);
            }
            self.global_view_projection = view_projection;
        }

        let detail_size = camera.far * DETAIL_SHADOW_SIZE_RATIO;
        let view_projection =
            cascade_matrix(camera, direction, DETAIL_SHADOW_FOCUS_INTERVAL, detail_size);
        if let Some(target) = self.targets.as_ref().and_then(|t| t.detail.as_ref()) {
            let mut pass = target.begin_depth_pass(encoder, "detail_shadow_pass");
            draw_scene(&mut pass, view_projection);
        }
        self.detail_view_projection = view_projection;
    }

    /// Whether the wide cascade renders this invocation
    fn take_coarse_turn(&mut self) -> bool {
        if self.global_rendered_last_frame {
            self.global_rendered_last_frame = false;
            false
        } else {
            self.global_rendered_last_frame = true;
            true
        }
    }

    /// Allocate render targets for the current profile if needed
    fn ensure_targets(&mut self, device: &wgpu::Device) {
        if self.targets.is_some() {
            return;
        }
        let profile = self.profile;
        if !profile.global_shadow_map && profile.max_shadowed_spot_lights == 0 {
            return;
        }

        let global = profile
            .global_shadow_map
            .then(|| ShadowTarget::new(device, profile.global_size, "global_shadow_map"));
        let detail = profile
            .global_shadow_map
            .then(|| ShadowTarget::new(device, profile.detail_size, "detail_shadow_map"));
        let spots = (0..profile.max_shadowed_spot_lights)
            .map(|_| ShadowTarget::new(device, profile.spot_size, "spot_shadow_map"))
            .collect();

        self.targets = Some(ShadowTargets {
            global,
            detail,
            spots,
            sampler: comparison_sampler(device),
            params_buffer: uniform_buffer(
                device,
                &GlobalLightParams::zeroed(),
                "global_light_params",
            ),
            material_buffer: uniform_buffer(device, &MaterialParams::zeroed(), "material_params"),
        });
    }

    /// Directional, ambient, and cascade data for the lighting pass.
    ///
    /// Shadow matrices are camera-relative: the scene renders translated
    /// around the camera, so the published matrix re-adds the camera
    /// position before projecting into light space.
    #[must_use]
    pub fn global_light_params(&self, camera: &Camera) -> GlobalLightParams {
        let rebase = Mat4::from_translation(camera.position);
        let mut params = GlobalLightParams::zeroed();
        for index in 0..MAX_DIRECTIONAL_LIGHTS {
            params.directional_directions[index] =
                self.directional_directions[index].extend(0.0).to_array();
            params.directional_colors[index] =
                self.directional_colors[index].extend(0.0).to_array();
        }
        params.ambient_color = self.ambient.extend(0.0).to_array();
        params.shadow_view_projection = (self.global_view_projection * rebase).to_cols_array_2d();
        params.detail_shadow_view_projection =
            (self.detail_view_projection * rebase).to_cols_array_2d();
        params.shadow_map_size = self.profile.global_size as f32;
        params.detail_shadow_map_size = self.profile.detail_size as f32;
        params
    }

    /// Packed specular table for the lighting pass
    #[must_use]
    pub fn material_params(&self) -> MaterialParams {
        let mut params = MaterialParams::zeroed();
        for (slot, pair) in self.materials.data().iter().enumerate() {
            params.materials[slot] = [pair[0], pair[1], 0.0, 0.0];
        }
        params
    }

    /// Per-light parameters for a spot light's volume pass
    #[must_use]
    pub fn spot_light_params(
        &self,
        light_index: usize,
        light: &SpotLight,
        camera: &Camera,
    ) -> SpotLightParams {
        let shadowed = light.shadowed && self.shadow_indices.contains_key(&light_index);
        let relative = light.position - camera.position;

        let horizontal_scale = (light.fov * 0.5).sin() * light.attenuation;
        let depth_scale = (light.fov * 0.5).cos() * light.attenuation;
        let world = Mat4::from_translation(relative)
            * Mat4::from_quat(light.orientation)
            * Mat4::from_scale(Vec3::new(horizontal_scale, horizontal_scale, depth_scale));

        SpotLightParams {
            view_projection: (light.view_projection()
                * Mat4::from_translation(camera.position))
            .to_cols_array_2d(),
            world: world.to_cols_array_2d(),
            position: relative.to_array(),
            radius: depth_scale,
            direction: light.direction().to_array(),
            shadowed: u32::from(shadowed),
            color: light.color.to_array(),
            shadow_bias: light.shadow_bias,
            shadow_map_size: if shadowed {
                self.profile.spot_size as f32
            } else {
                0.0
            },
            _padding: [0.0; 3],
        }
    }

    /// Per-light parameters for a point light's volume pass
    #[must_use]
    pub fn point_light_params(&self, light: &PointLight, camera: &Camera) -> PointLightParams {
        let relative = light.position - camera.position;
        PointLightParams {
            world: (Mat4::from_translation(relative)
                * Mat4::from_scale(Vec3::splat(light.attenuation)))
            .to_cols_array_2d(),
            position: relative.to_array(),
            radius: light.attenuation,
            color: light.color.to_array(),
            _padding: 0.0,
        }
    }

    /// Upload the frame's uniform data to the GPU buffers
    pub fn upload_params(&self, queue: &wgpu::Queue, camera: &Camera) {
        if let Some(targets) = &self.targets {
            queue.write_buffer(
                &targets.params_buffer,
                0,
                bytemuck::bytes_of(&self.global_light_params(camera)),
            );
            queue.write_buffer(
                &targets.material_buffer,
                0,
                bytemuck::bytes_of(&self.material_params()),
            );
        }
    }

    /// Bind group layout for the lighting pass resources
    #[must_use]
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let depth_texture = wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        };
        let uniform = wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        };
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lighting_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: uniform,
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: uniform,
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: depth_texture,
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: depth_texture,
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        })
    }

    /// Bind group over the global cascade resources.
    ///
    /// Returns `None` until the current quality's targets exist and
    /// include the global cascades.
    #[must_use]
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> Option<wgpu::BindGroup> {
        let targets = self.targets.as_ref()?;
        let global = targets.global.as_ref()?;
        let detail = targets.detail.as_ref()?;
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lighting_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: targets.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: targets.material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&global.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&detail.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&targets.sampler),
                },
            ],
        }))
    }

    /// Shadow map texture for an assigned spot slot
    #[must_use]
    pub fn spot_shadow_target(&self, slot: usize) -> Option<&ShadowTarget> {
        self.targets.as_ref()?.spots.get(slot)
    }
}

impl Default for LightingManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Orthographic light-space matrix for one cascade
fn cascade_matrix(
    camera: &Camera,
    light_direction: Vec3,
    focus_interval: f32,
    ortho_size: f32,
) -> Mat4 {
    let focus = snap_focus(camera.position, focus_interval);
    let eye = focus - light_direction * camera.far;
    let up = if light_direction.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(eye, focus, up);
    let half = ortho_size * 0.5;
    let projection = Mat4::orthographic_rh(-half, half, -half, half, 1.0, camera.far * 2.0);
    projection * view
}

/// Snap a focus point to a grid so the cascade only refocuses when the
/// camera has moved a whole interval
fn snap_focus(position: Vec3, interval: f32) -> Vec3 {
    (position / interval).round() * interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::lights::{AmbientLight, DirectionalLight};

    fn forward_camera() -> Camera {
        Camera::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0), Vec3::Y)
    }

    fn shadow_spot(position: Vec3, attenuation: f32) -> SpotLight {
        SpotLight::new(position, Vec3::NEG_Z, Vec3::ONE, attenuation).with_shadow()
    }

    #[test]
    fn test_medium_quality_profile() {
        let profile = ShadowQuality::Medium.profile();
        assert!(profile.global_shadow_map);
        assert_eq!(profile.global_size, 1024);
        assert_eq!(profile.detail_size, 1024);
        assert_eq!(profile.spot_size, 512);
        assert_eq!(profile.max_shadowed_spot_lights, 1);
    }

    #[test]
    fn test_spot_cap_per_quality() {
        assert_eq!(ShadowQuality::Off.profile().max_shadowed_spot_lights, 0);
        assert_eq!(ShadowQuality::Low.profile().max_shadowed_spot_lights, 1);
        assert_eq!(ShadowQuality::High.profile().max_shadowed_spot_lights, 2);
        assert_eq!(ShadowQuality::Ultra.profile().max_shadowed_spot_lights, 3);
    }

    #[test]
    fn test_shadowed_light_swaps_into_slot_zero() {
        let mut manager = LightingManager::new();
        let mut lights = LightSet::new();
        lights
            .directional
            .push(DirectionalLight::new(Vec3::NEG_Y, Vec3::X));
        lights
            .directional
            .push(DirectionalLight::new(Vec3::NEG_X, Vec3::Y).with_shadow());
        lights
            .directional
            .push(DirectionalLight::new(Vec3::NEG_Z, Vec3::Z));

        manager.update_global_lights(&lights);
        assert!(manager.has_global_shadow_light());
        // The shadow caster holds slot 0; the displaced light moved into
        // the caster's original slot.
        assert_eq!(manager.directional_colors[0], Vec3::Y);
        assert_eq!(manager.directional_colors[1], Vec3::X);
        assert_eq!(manager.directional_colors[2], Vec3::Z);
    }

    #[test]
    fn test_no_shadow_light_without_shadow_casters() {
        let mut manager = LightingManager::new();
        let mut lights = LightSet::new();
        lights
            .directional
            .push(DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE));

        manager.update_global_lights(&lights);
        assert!(!manager.has_global_shadow_light());
    }

    #[test]
    fn test_disabled_and_overflow_directional_lights_dropped() {
        let mut manager = LightingManager::new();
        let mut lights = LightSet::new();
        let mut disabled = DirectionalLight::new(Vec3::NEG_Y, Vec3::splat(9.0));
        disabled.enabled = false;
        let mut suspended = DirectionalLight::new(Vec3::NEG_Y, Vec3::splat(8.0));
        suspended.suspended = true;
        lights.directional.push(disabled);
        lights.directional.push(suspended);
        for value in 1..=4 {
            lights
                .directional
                .push(DirectionalLight::new(Vec3::NEG_Y, Vec3::splat(value as f32)));
        }

        manager.update_global_lights(&lights);
        assert_eq!(manager.directional_colors[0], Vec3::splat(1.0));
        assert_eq!(manager.directional_colors[1], Vec3::splat(2.0));
        assert_eq!(manager.directional_colors[2], Vec3::splat(3.0));
    }

    #[test]
    fn test_stale_directional_slots_are_zeroed() {
        let mut manager = LightingManager::new();
        let mut lights = LightSet::new();
        for _ in 0..3 {
            lights
                .directional
                .push(DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE));
        }
        manager.update_global_lights(&lights);

        lights.directional.truncate(1);
        manager.update_global_lights(&lights);
        assert_eq!(manager.directional_colors[1], Vec3::ZERO);
        assert_eq!(manager.directional_colors[2], Vec3::ZERO);
    }

    #[test]
    fn test_ambient_sums_enabled_lights() {
        let mut manager = LightingManager::new();
        let mut lights = LightSet::new();
        lights.ambient.push(AmbientLight::new(Vec3::new(0.1, 0.2, 0.3)));
        lights.ambient.push(AmbientLight::new(Vec3::new(0.2, 0.1, 0.0)));
        let mut off = AmbientLight::new(Vec3::splat(5.0));
        off.enabled = false;
        lights.ambient.push(off);

        manager.update_global_lights(&lights);
        assert!(manager.ambient_color().abs_diff_eq(Vec3::new(0.3, 0.3, 0.3), 1e-6));
    }

    #[test]
    fn test_spot_selection_orders_by_score_and_caps() {
        let mut manager = LightingManager::new();
        manager.set_quality(ShadowQuality::High); // cap 2
        let camera = forward_camera();

        let mut lights = LightSet::new();
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -20.0), 15.0)); // score 26.7
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -10.0), 15.0)); // score 6.7
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -15.0), 15.0)); // score 15.0

        let selected = manager.select_spot_shadows(&lights, &camera);
        assert_eq!(selected.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_spot_selection_filters() {
        let mut manager = LightingManager::new();
        manager.set_quality(ShadowQuality::Ultra);
        let camera = forward_camera();

        let mut lights = LightSet::new();
        // Score too high: 2500 / 10 >= 60.
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -50.0), 10.0));
        // Behind the camera.
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, 30.0), 15.0));
        // Not flagged for shadows.
        lights
            .spot
            .push(SpotLight::new(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z, Vec3::ONE, 15.0));
        // Dead attenuation.
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -10.0), 0.0));
        // Suspended.
        let mut sleeping = shadow_spot(Vec3::new(0.0, 0.0, -10.0), 15.0);
        sleeping.suspended = true;
        lights.spot.push(sleeping);

        assert!(manager.select_spot_shadows(&lights, &camera).is_empty());
    }

    #[test]
    fn test_spot_selection_is_idempotent() {
        let mut manager = LightingManager::new();
        manager.set_quality(ShadowQuality::Ultra);
        let camera = forward_camera();

        let mut lights = LightSet::new();
        for z in [-10.0, -14.0, -18.0, -22.0] {
            lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, z), 15.0));
        }

        let first = manager.select_spot_shadows(&lights, &camera);
        let second = manager.select_spot_shadows(&lights, &camera);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3); // Ultra cap
    }

    #[test]
    fn test_assign_records_slots_and_clears_old_ones() {
        let mut manager = LightingManager::new();
        manager.set_quality(ShadowQuality::High);
        let camera = forward_camera();

        let mut lights = LightSet::new();
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -20.0), 15.0));
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -10.0), 15.0));

        manager.assign_spot_shadows(&lights, &camera);
        assert_eq!(manager.spot_shadow_slot(1), Some(0));
        assert_eq!(manager.spot_shadow_slot(0), Some(1));

        // Closest light leaves; the map is rebuilt, not amended.
        lights.spot.remove(1);
        manager.assign_spot_shadows(&lights, &camera);
        assert_eq!(manager.spot_shadow_slot(0), Some(0));
        assert_eq!(manager.spot_shadow_slot(1), None);
    }

    #[test]
    fn test_set_quality_clears_assignments() {
        let mut manager = LightingManager::new();
        manager.set_quality(ShadowQuality::Low);
        let camera = forward_camera();
        let mut lights = LightSet::new();
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -10.0), 15.0));

        manager.assign_spot_shadows(&lights, &camera);
        assert!(manager.spot_shadow_slot(0).is_some());

        manager.set_quality(ShadowQuality::Off);
        assert!(manager.spot_shadow_slot(0).is_none());
        assert!(manager.select_spot_shadows(&lights, &camera).is_empty());
    }

    #[test]
    fn test_coarse_cascade_alternates() {
        let mut manager = LightingManager::new();
        assert!(manager.take_coarse_turn());
        assert!(!manager.take_coarse_turn());
        assert!(manager.take_coarse_turn());
        assert!(!manager.take_coarse_turn());
    }

    #[test]
    fn test_focus_snaps_to_interval() {
        let snapped = snap_focus(Vec3::new(12.3, 5.1, -7.8), 10.0);
        assert_eq!(snapped, Vec3::new(10.0, 10.0, -10.0));
        let fine = snap_focus(Vec3::new(12.3, 5.1, -7.8), 1.0);
        assert_eq!(fine, Vec3::new(12.0, 5.0, -8.0));
    }

    #[test]
    fn test_cascade_matrix_centers_on_snapped_focus() {
        let mut camera = forward_camera();
        camera.position = Vec3::new(12.3, 0.0, 3.9);
        let matrix = cascade_matrix(&camera, Vec3::new(0.0, -1.0, 0.0), 10.0, camera.far);

        // The snapped focus projects to the center of the clip volume.
        let focus = snap_focus(camera.position, 10.0);
        let clip = matrix * focus.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
    }

    #[test]
    fn test_material_index_saturates_through_manager() {
        let mut manager = LightingManager::new();
        for i in 1..MAX_MATERIALS {
            manager.material_index(Material::new(i as f32, 0.5));
        }
        assert_eq!(
            manager.material_index(Material::new(500.0, 0.5)),
            MAX_MATERIALS - 1
        );
    }

    #[test]
    fn test_global_params_publish_camera_relative_matrices() {
        let mut manager = LightingManager::new();
        let mut lights = LightSet::new();
        lights
            .directional
            .push(DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE).with_shadow());
        manager.update_global_lights(&lights);

        let camera = forward_camera();
        let params = manager.global_light_params(&camera);
        assert_eq!(params.shadow_map_size, 0.0); // quality still Off
        assert_eq!(params.directional_colors[0], [1.0, 1.0, 1.0, 0.0]);

        let mut medium = LightingManager::new();
        medium.set_quality(ShadowQuality::Medium);
        medium.update_global_lights(&lights);
        let params = medium.global_light_params(&camera);
        assert_eq!(params.shadow_map_size, 1024.0);
        assert_eq!(params.detail_shadow_map_size, 1024.0);
    }

    #[test]
    fn test_spot_params_mark_shadowed_lights() {
        let mut manager = LightingManager::new();
        manager.set_quality(ShadowQuality::Medium);
        let camera = forward_camera();

        let mut lights = LightSet::new();
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -10.0), 15.0));
        lights.spot.push(shadow_spot(Vec3::new(0.0, 0.0, -20.0), 15.0));
        manager.assign_spot_shadows(&lights, &camera);

        let near = manager.spot_light_params(0, &lights.spot[0], &camera);
        assert_eq!(near.shadowed, 1);
        assert_eq!(near.shadow_map_size, 512.0);

        // Medium allows one shadowed spot; the second goes without.
        let far = manager.spot_light_params(1, &lights.spot[1], &camera);
        assert_eq!(far.shadowed, 0);
        assert_eq!(far.shadow_map_size, 0.0);
    }

    #[test]
    fn test_point_params_are_camera_relative() {
        let manager = LightingManager::new();
        let mut camera = forward_camera();
        camera.position = Vec3::new(5.0, 0.0, 0.0);
        let light = PointLight::new(Vec3::new(8.0, 1.0, -2.0), Vec3::ONE, 20.0);

        let params = manager.point_light_params(&light, &camera);
        assert_eq!(params.position, [3.0, 1.0, -2.0]);
        assert_eq!(params.radius, 20.0);
    }
}
