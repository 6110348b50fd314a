//! Particula: block-based particle attribute storage for simulation hosts.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Particula sub-crates. For most users, adding `particula` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use particula::prelude::*;
//! use std::sync::Arc;
//!
//! // Emits ten particles of "Dust" per step, stacked along x.
//! struct Emitter {
//!     schema: Arc<AttributeSchema>,
//! }
//!
//! impl Simulator for Emitter {
//!     fn name(&self) -> &str { "emitter" }
//!     fn simulate(&self, state: &mut SimulationState) -> Result<(), SimulatorError> {
//!         let dust = state.particles_mut().lookup_or_create("Dust", &self.schema)?;
//!         dust.new_particles_with(10, |block, slots| {
//!             for (i, p) in block
//!                 .slots_mut::<Float3>(names::POSITION, slots)
//!                 .iter_mut()
//!                 .enumerate()
//!             {
//!                 *p = Float3::new(i as f32, 0.0, 0.0);
//!             }
//!         });
//!         Ok(())
//!     }
//! }
//!
//! let mut state = SimulationState::new(StateConfig::with_block_capacity(16)).unwrap();
//! let emitter = Emitter { schema: Arc::new(AttributeSchema::renderable()) };
//! let mut cache = FrameCache::new();
//!
//! for frame in 0..3 {
//!     let report = simulate_step(&mut state, &emitter, 1.0 / 24.0).unwrap();
//!     assert_eq!(report.total_particles(), 10 * (frame as usize + 1));
//!     cache.cache_frame(FrameIndex(frame), state.particles()).unwrap();
//! }
//!
//! let mesh = mesh_from_cache(cache.latest().unwrap());
//! assert_eq!(mesh, mesh_from_state(state.particles()));
//! cache.free_all();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `particula-core` | Attribute types, schemas, IDs, vector math |
//! | [`arena`] | `particula-arena` | Attribute blocks, block containers, flattening |
//! | [`state`] | `particula-state` | Particle registry, simulation time, stepping |
//! | [`cache`] | `particula-cache` | Per-frame snapshots of renderable attributes |
//! | [`mesh`] | `particula-mesh` | Point and tetrahedra meshes from state or cache |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Attribute types, schemas, and IDs (`particula-core`).
///
/// Contains [`types::AttributeType`], [`types::AttributeSchema`] and the
/// plain-old-data value types [`types::Float3`] and [`types::Rgba`].
pub use particula_core as types;

/// Block storage and flattening (`particula-arena`).
///
/// [`arena::BlockContainer`] owns the blocks of one particle type;
/// [`arena::flatten`] copies attributes in and out of contiguous buffers.
pub use particula_arena as arena;

/// Particle registry and simulation stepping (`particula-state`).
///
/// The [`state::Simulator`] trait is the main extension point for
/// user-defined particle behaviour.
pub use particula_state as state;

/// Frame cache (`particula-cache`).
///
/// [`cache::FrameCache`] keeps an owned copy of Position, Size and Color per
/// particle type for every cached frame.
pub use particula_cache as cache;

/// Mesh extraction (`particula-mesh`).
pub use particula_mesh as mesh;

/// Common imports for typical Particula usage.
///
/// ```rust
/// use particula::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use particula_core::{
        names, AttributeSchema, AttributeType, AttributeValue, BlockId, Float3, FrameIndex, Rgba,
    };

    // Storage
    pub use particula_arena::{AttributeBlock, BlockConfig, BlockContainer, SlotRange};

    // Errors
    pub use particula_arena::{ConfigError, FlattenError};
    pub use particula_cache::CacheError;
    pub use particula_state::{SimulatorError, StateError, StepError};

    // Simulation
    pub use particula_state::{
        simulate_step, ParticlesState, SimulationState, Simulator, StateConfig, StepReport,
    };

    // Cache and mesh
    pub use particula_cache::{CachedFrame, FrameCache};
    pub use particula_mesh::{
        extract_type_points, extract_type_tetrahedra, mesh_from_cache, mesh_from_state,
        point_mesh_from_state, Mesh,
    };
}
