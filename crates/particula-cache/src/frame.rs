//! Snapshot records: one frame, its particle types, their attribute buffers.

use smallvec::SmallVec;

use particula_core::names::{COLOR, POSITION, SIZE};
use particula_core::{Float3, FrameIndex, Rgba};

/// One attribute of one particle type, copied into a flat `f32` buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedAttribute {
    pub(crate) name: String,
    pub(crate) floats_per_particle: usize,
    pub(crate) values: Vec<f32>,
}

impl CachedAttribute {
    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of `f32` components per particle (3 for Position, 1 for
    /// Size, 4 for Color).
    pub fn floats_per_particle(&self) -> usize {
        self.floats_per_particle
    }

    /// All components, particle-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of particles recorded.
    pub fn particle_count(&self) -> usize {
        self.values
            .len()
            .checked_div(self.floats_per_particle)
            .unwrap_or(0)
    }
}

/// The recorded attributes of one particle type in one frame.
///
/// Attributes are always Position, Size and Color, in that order.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedType {
    pub(crate) name: String,
    pub(crate) particle_count: usize,
    pub(crate) attributes: SmallVec<[CachedAttribute; 3]>,
}

impl CachedType {
    /// Particle type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live particles at the time of caching.
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Every recorded attribute.
    pub fn attributes(&self) -> &[CachedAttribute] {
        &self.attributes
    }

    /// The recorded attribute called `name`, if any.
    pub fn attribute(&self, name: &str) -> Option<&CachedAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Positions in canonical particle order.
    pub fn positions(&self) -> &[Float3] {
        self.view(POSITION)
    }

    /// Sizes in canonical particle order.
    pub fn sizes(&self) -> &[f32] {
        self.view(SIZE)
    }

    /// Colors in canonical particle order.
    pub fn colors(&self) -> &[Rgba] {
        self.view(COLOR)
    }

    fn view<T: bytemuck::Pod>(&self, name: &str) -> &[T] {
        match self.attribute(name) {
            Some(attribute) => bytemuck::cast_slice(&attribute.values),
            None => &[],
        }
    }
}

/// Everything recorded for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedFrame {
    pub(crate) frame: FrameIndex,
    pub(crate) types: Vec<CachedType>,
}

impl CachedFrame {
    /// The frame this snapshot was taken at.
    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    /// Recorded particle types, in registry order at caching time.
    pub fn types(&self) -> &[CachedType] {
        &self.types
    }

    /// The recorded type called `name`, if any.
    pub fn particle_type(&self, name: &str) -> Option<&CachedType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Live particles across all recorded types.
    pub fn particle_count(&self) -> usize {
        self.types.iter().map(|t| t.particle_count).sum()
    }

    /// Number of attribute buffers owned by this frame.
    pub fn buffer_count(&self) -> usize {
        self.types.iter().map(|t| t.attributes.len()).sum()
    }

    /// Bytes held by this frame's attribute buffers.
    pub fn memory_bytes(&self) -> usize {
        self.types
            .iter()
            .flat_map(|t| t.attributes.iter())
            .map(|a| a.values.capacity() * std::mem::size_of::<f32>())
            .sum()
    }
}
