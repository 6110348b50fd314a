//! Test utilities and mock types for Particula development.
//!
//! Provides shared schemas, deterministic particle data keyed by index, and
//! helpers that build populated registries. Reusable [`Simulator`]
//! implementations live in [`fixtures`].
//!
//! [`Simulator`]: particula_state::Simulator

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use particula_arena::{BlockConfig, BlockContainer, SlotRanges};
use particula_core::names::{COLOR, POSITION, SIZE, VELOCITY};
use particula_core::{AttributeSchema, Float3, Rgba};
use particula_state::ParticlesState;

/// Position, Size and Color.
pub fn renderable_schema() -> Arc<AttributeSchema> {
    Arc::new(AttributeSchema::renderable())
}

/// Renderable attributes plus Velocity.
pub fn moving_schema() -> Arc<AttributeSchema> {
    Arc::new(
        AttributeSchema::builder()
            .attribute::<Float3>(POSITION)
            .attribute::<f32>(SIZE)
            .attribute::<Rgba>(COLOR)
            .attribute::<Float3>(VELOCITY)
            .build()
            .expect("fixture schema is valid"),
    )
}

/// A schema without Position, for negative cache and mesh tests.
pub fn sizes_only_schema() -> Arc<AttributeSchema> {
    Arc::new(
        AttributeSchema::builder()
            .attribute::<f32>(SIZE)
            .build()
            .expect("fixture schema is valid"),
    )
}

/// Position of the particle spawned with index `i`.
pub fn indexed_position(i: usize) -> Float3 {
    let x = i as f32;
    Float3::new(x, 2.0 * x, -x)
}

/// Size of the particle spawned with index `i`.
pub fn indexed_size(i: usize) -> f32 {
    1.0 + (i % 8) as f32 * 0.25
}

/// Color of the particle spawned with index `i`.
pub fn indexed_color(i: usize) -> Rgba {
    Rgba::new((i % 5) as f32 * 0.25, 0.5, 1.0, 1.0)
}

/// Spawn `n` particles with indexed Position, Size and Color, numbering
/// them from `first_index`.
///
/// # Panics
///
/// Panics if the container's schema lacks a renderable attribute.
pub fn spawn_indexed(container: &mut BlockContainer, n: usize, first_index: usize) -> SlotRanges {
    let mut index = first_index;
    container.new_particles_with(n, |block, slots| {
        let start = index;
        for (i, p) in block
            .slots_mut::<Float3>(POSITION, slots.clone())
            .iter_mut()
            .enumerate()
        {
            *p = indexed_position(start + i);
        }
        for (i, s) in block
            .slots_mut::<f32>(SIZE, slots.clone())
            .iter_mut()
            .enumerate()
        {
            *s = indexed_size(start + i);
        }
        for (i, c) in block
            .slots_mut::<Rgba>(COLOR, slots.clone())
            .iter_mut()
            .enumerate()
        {
            *c = indexed_color(start + i);
        }
        index += slots.len();
    })
}

/// A registry with one renderable type per `(name, count)` pair, each
/// populated by [`spawn_indexed`] from index 0.
pub fn populated_state(block_capacity: usize, types: &[(&str, usize)]) -> ParticlesState {
    let mut state =
        ParticlesState::new(BlockConfig::new(block_capacity)).expect("fixture config is valid");
    let schema = renderable_schema();
    for &(name, count) in types {
        let container = state
            .lookup_or_create(name, &schema)
            .expect("fixture types share one schema");
        spawn_indexed(container, count, 0);
    }
    state
}
