//! The frame cache: an append-only list of per-frame snapshots.

use smallvec::SmallVec;

use particula_arena::flatten::flatten_into;
use particula_arena::BlockContainer;
use particula_core::names::{COLOR, POSITION, SIZE};
use particula_core::{AttributeValue, Float3, FrameIndex, Rgba};
use particula_state::ParticlesState;

use crate::error::CacheError;
use crate::frame::{CachedAttribute, CachedFrame, CachedType};

/// Snapshots of Position, Size and Color for every particle type, one per
/// cached frame.
///
/// The cache is an explicit owned value: whoever drives the simulation
/// holds it and passes it where frames are recorded or read.
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: Vec<CachedFrame>,
}

impl FrameCache {
    /// An empty cache. Allocates nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every particle type of `particles` as frame `frame`.
    ///
    /// The frame list grows by exactly one entry. Frame indices are not
    /// required to be unique or increasing.
    ///
    /// # Errors
    ///
    /// [`CacheError::MissingAttribute`] or [`CacheError::WrongAttributeType`]
    /// if any type lacks a renderable attribute. Every type is checked before
    /// anything is copied, so on error nothing is appended.
    pub fn cache_frame(
        &mut self,
        frame: FrameIndex,
        particles: &ParticlesState,
    ) -> Result<(), CacheError> {
        for (name, container) in particles.iter() {
            check::<Float3>(name, container, POSITION)?;
            check::<f32>(name, container, SIZE)?;
            check::<Rgba>(name, container, COLOR)?;
        }

        let mut types = Vec::with_capacity(particles.len());
        for (name, container) in particles.iter() {
            let mut attributes = SmallVec::new();
            attributes.push(snapshot::<Float3>(container, POSITION)?);
            attributes.push(snapshot::<f32>(container, SIZE)?);
            attributes.push(snapshot::<Rgba>(container, COLOR)?);
            types.push(CachedType {
                name: name.to_owned(),
                particle_count: container.count_active(),
                attributes,
            });
        }

        let cached = CachedFrame { frame, types };
        tracing::debug!(
            %frame,
            types = cached.types.len(),
            particles = cached.particle_count(),
            "cached frame"
        );
        self.frames.reserve_exact(1);
        self.frames.push(cached);
        Ok(())
    }

    /// Every cached frame, in append order.
    pub fn frames(&self) -> &[CachedFrame] {
        &self.frames
    }

    /// The most recently appended frame recorded as `frame`.
    pub fn frame_at(&self, frame: FrameIndex) -> Option<&CachedFrame> {
        self.frames.iter().rev().find(|f| f.frame == frame)
    }

    /// The most recently appended frame.
    pub fn latest(&self) -> Option<&CachedFrame> {
        self.frames.last()
    }

    /// Number of cached frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame is cached.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Release every frame, type record and attribute buffer, including the
    /// frame list's own allocation.
    pub fn free_all(&mut self) {
        let frames = self.frames.len();
        let buffers = self.buffer_count();
        self.frames = Vec::new();
        tracing::debug!(frames, buffers, "freed frame cache");
    }

    /// Number of attribute buffers held across all frames.
    pub fn buffer_count(&self) -> usize {
        self.frames.iter().map(CachedFrame::buffer_count).sum()
    }

    /// Bytes held by attribute buffers across all frames.
    pub fn memory_bytes(&self) -> usize {
        self.frames.iter().map(CachedFrame::memory_bytes).sum()
    }
}

fn check<T: AttributeValue>(
    particle_type: &str,
    container: &BlockContainer,
    attribute: &'static str,
) -> Result<(), CacheError> {
    match container.schema().type_of(attribute) {
        None => Err(CacheError::MissingAttribute {
            particle_type: particle_type.to_owned(),
            attribute,
        }),
        Some(ty) if !ty.is::<T>() => Err(CacheError::WrongAttributeType {
            particle_type: particle_type.to_owned(),
            attribute,
            expected: T::TYPE_NAME,
            actual: ty.name(),
        }),
        Some(_) => Ok(()),
    }
}

fn snapshot<T: AttributeValue>(
    container: &BlockContainer,
    attribute: &str,
) -> Result<CachedAttribute, CacheError> {
    let floats_per_particle = std::mem::size_of::<T>() / std::mem::size_of::<f32>();
    let mut values = vec![0.0f32; container.count_active() * floats_per_particle];
    flatten_into(container, attribute, bytemuck::cast_slice_mut(&mut values))?;
    Ok(CachedAttribute {
        name: attribute.to_owned(),
        floats_per_particle,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use particula_arena::BlockConfig;
    use particula_core::AttributeSchema;
    use particula_test_utils::{
        indexed_color, indexed_position, indexed_size, populated_state, sizes_only_schema,
    };
    use std::sync::Arc;

    #[test]
    fn new_cache_is_empty() {
        let cache = FrameCache::new();
        assert!(cache.is_empty());
        assert!(cache.latest().is_none());
        assert_eq!(cache.buffer_count(), 0);
    }

    #[test]
    fn cache_frame_records_every_type() {
        let state = populated_state(4, &[("Dust", 10), ("Sparks", 3)]);
        let mut cache = FrameCache::new();
        cache.cache_frame(FrameIndex(1), &state).unwrap();

        let frame = cache.latest().unwrap();
        assert_eq!(frame.frame(), FrameIndex(1));
        assert_eq!(frame.types().len(), 2);
        assert_eq!(frame.particle_count(), 13);
        assert_eq!(frame.buffer_count(), 6);

        let dust = frame.particle_type("Dust").unwrap();
        assert_eq!(dust.particle_count(), 10);
        let expected: Vec<_> = (0..10).map(indexed_position).collect();
        assert_eq!(dust.positions(), expected.as_slice());
        assert_eq!(dust.sizes()[7], indexed_size(7));
        assert_eq!(dust.colors()[3], indexed_color(3));

        let position = dust.attribute(POSITION).unwrap();
        assert_eq!(position.floats_per_particle(), 3);
        assert_eq!(position.values().len(), 30);
        assert_eq!(position.particle_count(), 10);
        assert_eq!(dust.attribute(SIZE).unwrap().floats_per_particle(), 1);
        assert_eq!(dust.attribute(COLOR).unwrap().floats_per_particle(), 4);
    }

    #[test]
    fn frames_append_in_order() {
        let mut state = populated_state(8, &[("Dust", 2)]);
        let mut cache = FrameCache::new();
        cache.cache_frame(FrameIndex(0), &state).unwrap();
        state.lookup_mut("Dust").unwrap().new_particles(3);
        cache.cache_frame(FrameIndex(1), &state).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.frames()[0].particle_count(), 2);
        assert_eq!(cache.frame_at(FrameIndex(1)).unwrap().particle_count(), 5);
        assert!(cache.frame_at(FrameIndex(7)).is_none());
    }

    #[test]
    fn duplicate_frame_index_resolves_to_latest() {
        let mut state = populated_state(8, &[("Dust", 1)]);
        let mut cache = FrameCache::new();
        cache.cache_frame(FrameIndex(3), &state).unwrap();
        state.lookup_mut("Dust").unwrap().new_particles(1);
        cache.cache_frame(FrameIndex(3), &state).unwrap();
        assert_eq!(cache.frame_at(FrameIndex(3)).unwrap().particle_count(), 2);
    }

    #[test]
    fn empty_registry_caches_an_empty_frame() {
        let state = ParticlesState::default();
        let mut cache = FrameCache::new();
        cache.cache_frame(FrameIndex(0), &state).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.latest().unwrap().types().is_empty());
    }

    #[test]
    fn missing_attribute_appends_nothing() {
        let mut state = populated_state(4, &[("Dust", 5)]);
        state
            .lookup_or_create("Smoke", &sizes_only_schema())
            .unwrap()
            .new_particles(2);
        let mut cache = FrameCache::new();
        let err = cache.cache_frame(FrameIndex(0), &state).unwrap_err();
        assert_eq!(
            err,
            CacheError::MissingAttribute {
                particle_type: "Smoke".into(),
                attribute: POSITION,
            }
        );
        assert!(cache.is_empty());
        assert_eq!(cache.memory_bytes(), 0);
    }

    #[test]
    fn wrong_attribute_type_rejected() {
        let schema = Arc::new(
            AttributeSchema::builder()
                .attribute::<Float3>(POSITION)
                .attribute::<Float3>(SIZE)
                .attribute::<Rgba>(COLOR)
                .build()
                .unwrap(),
        );
        let mut state = ParticlesState::new(BlockConfig::new(4)).unwrap();
        state.lookup_or_create("Odd", &schema).unwrap();
        let mut cache = FrameCache::new();
        let err = cache.cache_frame(FrameIndex(0), &state).unwrap_err();
        assert_eq!(
            err,
            CacheError::WrongAttributeType {
                particle_type: "Odd".into(),
                attribute: SIZE,
                expected: "float",
                actual: "float3",
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn free_all_releases_everything() {
        let state = populated_state(4, &[("Dust", 10)]);
        let mut cache = FrameCache::new();
        cache.cache_frame(FrameIndex(0), &state).unwrap();
        cache.cache_frame(FrameIndex(1), &state).unwrap();
        assert_eq!(cache.buffer_count(), 6);
        assert_eq!(cache.memory_bytes(), 2 * 10 * (3 + 1 + 4) * 4);

        cache.free_all();
        assert!(cache.is_empty());
        assert_eq!(cache.buffer_count(), 0);
        assert_eq!(cache.memory_bytes(), 0);
        assert_eq!(cache.frames.capacity(), 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn cached_frame_mirrors_live_population(
                dust in 0usize..200,
                sparks in 0usize..50,
                frames in 1usize..6,
            ) {
                let state = populated_state(16, &[("Dust", dust), ("Sparks", sparks)]);
                let mut cache = FrameCache::new();
                for frame in 0..frames {
                    cache.cache_frame(FrameIndex(frame as i32), &state).unwrap();
                }
                prop_assert_eq!(cache.len(), frames);
                prop_assert_eq!(cache.buffer_count(), frames * 2 * 3);

                let latest = cache.latest().unwrap();
                prop_assert_eq!(latest.particle_count(), dust + sparks);
                let live = state.lookup("Dust").unwrap();
                let sizes = live.flatten_attribute::<f32>(SIZE);
                prop_assert_eq!(latest.particle_type("Dust").unwrap().sizes(), sizes.as_slice());

                cache.free_all();
                prop_assert_eq!(cache.memory_bytes(), 0);
            }
        }
    }
}
