//! Particle emitters
//!
//! CPU-simulated particles with configurable emitters. Simulation is
//! deterministic per emitter (seeded xorshift), so effects can be asserted
//! in tests; upload to the GPU is a plain vertex buffer refresh.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use wgpu::util::DeviceExt;

/// A single particle, laid out for direct GPU upload
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Particle {
    /// World position
    pub position: [f32; 3],
    /// Total lifetime in seconds
    pub lifetime: f32,
    /// Velocity
    pub velocity: [f32; 3],
    /// Seconds since spawn
    pub age: f32,
    /// Current color (RGBA)
    pub color: [f32; 4],
    /// Current billboard size
    pub size: f32,
    /// Size at spawn
    pub start_size: f32,
    /// Size at death
    pub end_size: f32,
    _padding: f32,
}

/// Particle emitter configuration
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Ceiling on live particles
    pub max_particles: u32,
    /// Spawn rate in particles per second
    pub spawn_rate: f32,
    /// Lifetime range in seconds (min, max)
    pub lifetime: (f32, f32),
    /// Lower corner of the initial velocity box
    pub velocity_min: Vec3,
    /// Upper corner of the initial velocity box
    pub velocity_max: Vec3,
    /// Spawn size range (min, max)
    pub size: (f32, f32),
    /// Size range at end of life (min, max)
    pub end_size: (f32, f32),
    /// Color at spawn
    pub start_color: Vec4,
    /// Color at death
    pub end_color: Vec4,
    /// Constant acceleration
    pub gravity: Vec3,
    /// Whether the emitter keeps spawning indefinitely
    pub looping: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            spawn_rate: 100.0,
            lifetime: (1.0, 2.0),
            velocity_min: Vec3::new(-1.0, 1.0, -1.0),
            velocity_max: Vec3::new(1.0, 3.0, 1.0),
            size: (0.1, 0.3),
            end_size: (0.0, 0.0),
            start_color: Vec4::ONE,
            end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            gravity: Vec3::new(0.0, -9.8, 0.0),
            looping: true,
        }
    }
}

/// Particle emitter
#[derive(Debug)]
pub struct ParticleEmitter {
    /// Configuration
    pub config: EmitterConfig,
    /// World position new particles spawn from
    pub position: Vec3,
    particles: Vec<Particle>,
    spawn_accumulator: f32,
    active: bool,
    rng: u32,
    buffer: Option<wgpu::Buffer>,
}

impl ParticleEmitter {
    /// Create a new emitter
    #[must_use]
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            particles: Vec::with_capacity(config.max_particles as usize),
            config,
            position: Vec3::ZERO,
            spawn_accumulator: 0.0,
            active: true,
            rng: 0x1234_5677 | 1,
            buffer: None,
        }
    }

    /// Move the spawn point
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Resume spawning
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Stop emitting; live particles finish their lifetimes
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Remove all particles
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Number of live particles
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Whether the emitter is spawning
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Live particle data
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Advance all particles and spawn new ones
    pub fn update(&mut self, delta_time: f32) {
        let gravity = self.config.gravity;
        let start = self.config.start_color;
        let end = self.config.end_color;

        self.particles.retain_mut(|particle| {
            particle.age += delta_time;

            particle.velocity[0] += gravity.x * delta_time;
            particle.velocity[1] += gravity.y * delta_time;
            particle.velocity[2] += gravity.z * delta_time;

            particle.position[0] += particle.velocity[0] * delta_time;
            particle.position[1] += particle.velocity[1] * delta_time;
            particle.position[2] += particle.velocity[2] * delta_time;

            let t = (particle.age / particle.lifetime).clamp(0.0, 1.0);
            let color = start + (end - start) * t;
            particle.color = color.to_array();
            particle.size = lerp(particle.start_size, particle.end_size, t);

            particle.age < particle.lifetime
        });

        if self.active {
            self.spawn_accumulator += self.config.spawn_rate * delta_time;
            while self.spawn_accumulator >= 1.0
                && self.particles.len() < self.config.max_particles as usize
            {
                self.spawn_particle();
                self.spawn_accumulator -= 1.0;
            }
            // One-shot emitters stop once their burst is out.
            if !self.config.looping && self.particles.len() >= self.config.max_particles as usize {
                self.active = false;
            }
        }
    }

    /// Spawn a single particle
    fn spawn_particle(&mut self) {
        let lifetime = lerp(self.config.lifetime.0, self.config.lifetime.1, self.rand_f32());
        let velocity = Vec3::new(
            lerp(self.config.velocity_min.x, self.config.velocity_max.x, self.rand_f32()),
            lerp(self.config.velocity_min.y, self.config.velocity_max.y, self.rand_f32()),
            lerp(self.config.velocity_min.z, self.config.velocity_max.z, self.rand_f32()),
        );
        let size = lerp(self.config.size.0, self.config.size.1, self.rand_f32());
        let end_size = lerp(self.config.end_size.0, self.config.end_size.1, self.rand_f32());

        self.particles.push(Particle {
            position: self.position.to_array(),
            lifetime: lifetime.max(f32::EPSILON),
            velocity: velocity.to_array(),
            age: 0.0,
            color: self.config.start_color.to_array(),
            size,
            start_size: size,
            end_size,
            _padding: 0.0,
        });
    }

    /// Upload the live particles to a fresh vertex buffer
    pub fn upload(&mut self, device: &wgpu::Device) {
        self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle_buffer"),
            contents: bytemuck::cast_slice(&self.particles),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        }));
    }

    /// The uploaded vertex buffer, if any
    #[must_use]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// xorshift32, deterministic per emitter
    fn rand_f32(&mut self) -> f32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x >> 8) as f32 / (1 << 24) as f32
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_rate_accumulates() {
        let mut emitter = ParticleEmitter::new(EmitterConfig {
            spawn_rate: 10.0,
            ..Default::default()
        });
        emitter.update(0.05); // 0.5 particles accumulated
        assert_eq!(emitter.particle_count(), 0);
        emitter.update(0.05);
        assert_eq!(emitter.particle_count(), 1);
    }

    #[test]
    fn test_particles_retire_at_end_of_life() {
        let mut emitter = ParticleEmitter::new(EmitterConfig {
            spawn_rate: 100.0,
            lifetime: (0.5, 0.5),
            ..Default::default()
        });
        emitter.update(0.1);
        assert!(emitter.particle_count() > 0);

        emitter.stop();
        emitter.update(1.0);
        assert_eq!(emitter.particle_count(), 0);
    }

    #[test]
    fn test_stopped_emitter_spawns_nothing() {
        let mut emitter = ParticleEmitter::new(EmitterConfig::default());
        emitter.stop();
        emitter.update(1.0);
        assert_eq!(emitter.particle_count(), 0);
        assert!(!emitter.is_active());
    }

    #[test]
    fn test_max_particles_is_a_ceiling() {
        let mut emitter = ParticleEmitter::new(EmitterConfig {
            max_particles: 16,
            spawn_rate: 10_000.0,
            lifetime: (10.0, 10.0),
            ..Default::default()
        });
        emitter.update(0.5);
        assert_eq!(emitter.particle_count(), 16);
    }

    #[test]
    fn test_color_fades_toward_end_color() {
        let mut emitter = ParticleEmitter::new(EmitterConfig {
            spawn_rate: 100.0,
            lifetime: (1.0, 1.0),
            start_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            ..Default::default()
        });
        emitter.update(0.1);
        emitter.stop();
        emitter.update(0.8);
        let particle = emitter.particles()[0];
        assert!(particle.color[3] < 0.2);
    }

    #[test]
    fn test_size_shrinks_toward_end_size() {
        let mut emitter = ParticleEmitter::new(EmitterConfig {
            spawn_rate: 100.0,
            lifetime: (1.0, 1.0),
            size: (0.5, 0.5),
            end_size: (0.0, 0.0),
            ..Default::default()
        });
        emitter.update(0.1);
        emitter.stop();
        emitter.update(0.8);
        let particle = emitter.particles()[0];
        assert!(particle.size < 0.1);
        assert_eq!(particle.start_size, 0.5);
    }
}
