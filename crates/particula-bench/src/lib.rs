//! Benchmark profiles and utilities for the Particula storage engine.
//!
//! Provides pre-built registries for benchmarking:
//!
//! - [`reference_state`]: 100K particles over 4 types, densely packed
//! - [`fragmented_state`]: the same population after deterministic churn,
//!   leaving partially filled blocks
//! - [`churn_slots`]: deterministic per-block removal sets

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use particula_core::BlockId;
use particula_state::ParticlesState;
use particula_test_utils::{populated_state, spawn_indexed};

/// Block capacity used by every profile.
pub const BENCH_BLOCK_CAPACITY: usize = 1024;

/// Particle types and counts of the reference population (100K total).
pub const REFERENCE_TYPES: [(&str, usize); 4] = [
    ("Dust", 60_000),
    ("Sparks", 25_000),
    ("Smoke", 10_000),
    ("Debris", 5_000),
];

/// Densely packed reference population.
pub fn reference_state() -> ParticlesState {
    populated_state(BENCH_BLOCK_CAPACITY, &REFERENCE_TYPES)
}

/// Reference population after removing roughly a quarter of each block and
/// spawning a tenth back, so blocks are unevenly filled.
pub fn fragmented_state(seed: u64) -> ParticlesState {
    let mut state = reference_state();
    for (_, container) in state.iter_mut() {
        let blocks = container.block_count();
        for b in 0..blocks {
            let id = BlockId(b as u32);
            let active = container.block(id).map_or(0, |block| block.active_count());
            let mut slots = churn_slots(active, seed ^ b as u64);
            container.remove_particles(id, &mut slots);
        }
        let refill = container.count_active() / 10;
        spawn_indexed(container, refill, 1_000_000);
    }
    state
}

/// Deterministic set of distinct slots to remove from a block of `active`
/// live particles: every fourth slot, rotated by `seed`.
pub fn churn_slots(active: usize, seed: u64) -> Vec<usize> {
    let offset = (seed.wrapping_mul(6364136223846793005) >> 33) as usize % 4;
    (offset..active).step_by(4).collect()
}
