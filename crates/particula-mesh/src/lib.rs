//! Mesh extraction for Particula particles.
//!
//! Particles are drawn either as bare vertices ([`points_mesh`]) or as one
//! small tetrahedron per particle, sized by `Size` and tinted by `Color`
//! ([`tetrahedra_mesh`]). The [`extract`] functions gather the per-particle
//! data from live simulation state or from a cached frame.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod extract;
pub mod mesh;

pub use extract::{
    extract_type_points, extract_type_tetrahedra, mesh_from_cache, mesh_from_state,
    point_mesh_from_state,
};
pub use mesh::{points_mesh, tetrahedra_mesh, Mesh, MeshLoop, MeshPoly, PackedNormal};
