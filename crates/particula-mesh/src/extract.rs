//! Building meshes from live simulation state or cached frames.
//!
//! Every particle type contributes its particles in canonical order, types
//! in registry order. Unknown type names yield an empty mesh; a type that
//! lacks Position, Size or Color is a caller bug and panics.

use particula_arena::flatten::par_flatten;
use particula_arena::BlockContainer;
use particula_cache::CachedFrame;
use particula_core::names::{COLOR, POSITION, SIZE};
use particula_core::{Float3, Rgba};
use particula_state::ParticlesState;

use crate::mesh::{points_mesh, tetrahedra_mesh, Mesh};

#[derive(Default)]
struct Instances {
    positions: Vec<Float3>,
    sizes: Vec<f32>,
    colors: Vec<Rgba>,
}

impl Instances {
    fn extend_from(&mut self, container: &BlockContainer) {
        self.positions
            .extend(par_flatten::<Float3>(container, POSITION));
        self.sizes.extend(par_flatten::<f32>(container, SIZE));
        self.colors.extend(par_flatten::<Rgba>(container, COLOR));
    }

    fn into_mesh(self) -> Mesh {
        tetrahedra_mesh(&self.positions, &self.sizes, &self.colors)
    }
}

/// One tetrahedron per particle of every type.
pub fn mesh_from_state(particles: &ParticlesState) -> Mesh {
    let mut instances = Instances::default();
    for (_, container) in particles.iter() {
        instances.extend_from(container);
    }
    instances.into_mesh()
}

/// One vertex per particle of every type.
pub fn point_mesh_from_state(particles: &ParticlesState) -> Mesh {
    let mut positions = Vec::with_capacity(particles.total_active());
    for (_, container) in particles.iter() {
        positions.extend(par_flatten::<Float3>(container, POSITION));
    }
    points_mesh(&positions)
}

/// One tetrahedron per particle of type `name`, or an empty mesh if the
/// type does not exist.
pub fn extract_type_tetrahedra(particles: &ParticlesState, name: &str) -> Mesh {
    let Some(container) = particles.lookup(name) else {
        tracing::debug!(particle_type = name, "no such particle type");
        return Mesh::default();
    };
    let mut instances = Instances::default();
    instances.extend_from(container);
    instances.into_mesh()
}

/// One vertex per particle of type `name`, or an empty mesh if the type
/// does not exist.
pub fn extract_type_points(particles: &ParticlesState, name: &str) -> Mesh {
    match particles.lookup(name) {
        Some(container) => points_mesh(&par_flatten::<Float3>(container, POSITION)),
        None => {
            tracing::debug!(particle_type = name, "no such particle type");
            Mesh::default()
        }
    }
}

/// One tetrahedron per particle recorded in `frame`.
pub fn mesh_from_cache(frame: &CachedFrame) -> Mesh {
    let count = frame.particle_count();
    let mut instances = Instances {
        positions: Vec::with_capacity(count),
        sizes: Vec::with_capacity(count),
        colors: Vec::with_capacity(count),
    };
    for cached in frame.types() {
        instances.positions.extend_from_slice(cached.positions());
        instances.sizes.extend_from_slice(cached.sizes());
        instances.colors.extend_from_slice(cached.colors());
    }
    instances.into_mesh()
}
