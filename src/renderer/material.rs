//! Specular material table
//!
//! Draw calls register their specular settings each frame and get back a
//! small integer index; the lighting pass consumes the packed table. The
//! table is bounded: once it is full, further distinct materials all share
//! the last slot rather than evicting anything.

use rustc_hash::FxHashMap;

/// Number of material slots published to the lighting pass
pub const MAX_MATERIALS: usize = 16;

/// Specular response of a surface.
///
/// Equality and hashing are bit-exact on purpose: the table keys on the
/// values a draw call actually passed, not on approximate matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Material {
    /// Specular exponent
    pub specular_power: f32,
    /// Specular strength
    pub specular_intensity: f32,
}

impl Material {
    /// Create a material from power and intensity
    #[must_use]
    pub const fn new(specular_power: f32, specular_intensity: f32) -> Self {
        Self {
            specular_power,
            specular_intensity,
        }
    }

    /// The unlit material reserved in slot 0
    #[must_use]
    pub const fn unlit() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.specular_power.to_bits() == other.specular_power.to_bits()
            && self.specular_intensity.to_bits() == other.specular_intensity.to_bits()
    }
}

impl Eq for Material {}

impl std::hash::Hash for Material {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.specular_power.to_bits().hash(state);
        self.specular_intensity.to_bits().hash(state);
    }
}

/// Per-frame material registrations plus the packed table they publish.
///
/// [`flush`](Self::flush) moves the frame's registrations into the packed
/// array and restarts registration with the unlit material in slot 0.
/// Slots that were not re-registered keep their previous values; nothing
/// downstream reads past the published indices.
#[derive(Debug)]
pub struct MaterialTable {
    indices: FxHashMap<Material, usize>,
    data: [[f32; 2]; MAX_MATERIALS],
}

impl MaterialTable {
    /// Create a table with only the unlit material registered
    #[must_use]
    pub fn new() -> Self {
        let mut indices = FxHashMap::default();
        indices.insert(Material::unlit(), 0);
        Self {
            indices,
            data: [[0.0; 2]; MAX_MATERIALS],
        }
    }

    /// Index for a material, registering it if there is room.
    ///
    /// A full table returns the last slot without registering, so overflow
    /// saturates instead of erroring.
    pub fn index_of(&mut self, material: Material) -> usize {
        if let Some(&index) = self.indices.get(&material) {
            return index;
        }
        if self.indices.len() == MAX_MATERIALS {
            return MAX_MATERIALS - 1;
        }
        let index = self.indices.len();
        self.indices.insert(material, index);
        index
    }

    /// Publish this frame's registrations and start the next frame
    pub fn flush(&mut self) {
        for (material, &index) in &self.indices {
            self.data[index] = [material.specular_power, material.specular_intensity];
        }
        self.indices.clear();
        self.indices.insert(Material::unlit(), 0);
    }

    /// The packed specular table
    #[must_use]
    pub const fn data(&self) -> &[[f32; 2]; MAX_MATERIALS] {
        &self.data
    }

    /// Number of materials registered this frame
    #[must_use]
    pub fn registered(&self) -> usize {
        self.indices.len()
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}
