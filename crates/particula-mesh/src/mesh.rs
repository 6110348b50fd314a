//! Mesh buffers and the two instancing layouts: points and tetrahedra.

use rayon::prelude::*;

use particula_core::{Float3, Rgba, Rgba8};

/// A polygon: a run of consecutive loops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshPoly {
    /// Index of the first loop.
    pub loop_start: u32,
    /// Number of loops.
    pub loop_count: u32,
}

/// A polygon corner: one vertex and the edge leaving it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshLoop {
    /// Vertex index.
    pub vertex: u32,
    /// Edge index.
    pub edge: u32,
}

/// Vertex normal stored as signed 16-bit fixed point (`32767` = 1.0).
pub type PackedNormal = [i16; 3];

/// Normal pointing along +Z, given to every vertex of a point mesh.
pub const UP_NORMAL: PackedNormal = [0, 0, 32767];

/// Flat mesh buffers in the layout a host DCC application consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Float3>,
    normals: Vec<PackedNormal>,
    edges: Vec<[u32; 2]>,
    polys: Vec<MeshPoly>,
    loops: Vec<MeshLoop>,
    loop_colors: Vec<Rgba8>,
}

impl Mesh {
    /// Vertex positions.
    pub fn positions(&self) -> &[Float3] {
        &self.positions
    }

    /// Per-vertex normals, same length as [`positions`](Self::positions).
    pub fn normals(&self) -> &[PackedNormal] {
        &self.normals
    }

    /// Edges as vertex index pairs.
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    /// Polygons.
    pub fn polys(&self) -> &[MeshPoly] {
        &self.polys
    }

    /// Polygon corners.
    pub fn loops(&self) -> &[MeshLoop] {
        &self.loops
    }

    /// Per-loop colors, same length as [`loops`](Self::loops).
    pub fn loop_colors(&self) -> &[Rgba8] {
        &self.loop_colors
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether the mesh has no vertices.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A vertex-only mesh with one vertex per point, every normal set to
/// [`UP_NORMAL`].
pub fn points_mesh(points: &[Float3]) -> Mesh {
    Mesh {
        positions: points.to_vec(),
        normals: vec![UP_NORMAL; points.len()],
        ..Mesh::default()
    }
}

// ── Tetrahedron topology ─────────────────────────────────────────

const TET_VERTICES: [Float3; 4] = [
    Float3::new(1.0, -1.0, -1.0),
    Float3::new(1.0, 1.0, 1.0),
    Float3::new(-1.0, -1.0, 1.0),
    Float3::new(-1.0, 1.0, -1.0),
];
const TET_LOOP_STARTS: [u32; 4] = [0, 3, 6, 9];
const TET_LOOP_LENGTHS: [u32; 4] = [3, 3, 3, 3];
const TET_LOOP_VERTICES: [u32; 12] = [0, 1, 2, 0, 3, 1, 0, 2, 3, 1, 2, 3];
const TET_LOOP_EDGES: [u32; 12] = [0, 3, 1, 2, 4, 0, 1, 5, 2, 3, 5, 4];
const TET_EDGES: [[u32; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Vertices per tetrahedron.
pub const TET_VERTEX_COUNT: usize = TET_VERTICES.len();
/// Edges per tetrahedron.
pub const TET_EDGE_COUNT: usize = TET_EDGES.len();
/// Triangles per tetrahedron.
pub const TET_POLY_COUNT: usize = TET_LOOP_STARTS.len();
/// Loops per tetrahedron.
pub const TET_LOOP_COUNT: usize = TET_LOOP_VERTICES.len();

/// Instances handled per parallel work item.
pub const INSTANCES_PER_TASK: usize = 1000;

/// Largest instance count whose loop indices fit in `u32`.
pub const MAX_TETRAHEDRA: usize = u32::MAX as usize / TET_LOOP_COUNT;

/// One tetrahedron per instance, centred at `centers[i]`, scaled by
/// `scales[i]` and colored `colors[i]`.
///
/// Instances are written in parallel, each into its own fixed offset of the
/// output buffers, so the result does not depend on scheduling.
///
/// # Panics
///
/// Panics if the three slices differ in length or hold more than
/// [`MAX_TETRAHEDRA`] instances.
pub fn tetrahedra_mesh(centers: &[Float3], scales: &[f32], colors: &[Rgba]) -> Mesh {
    let amount = centers.len();
    assert!(
        scales.len() == amount && colors.len() == amount,
        "instance arrays differ in length: {} centers, {} scales, {} colors",
        amount,
        scales.len(),
        colors.len(),
    );
    assert!(
        amount <= MAX_TETRAHEDRA,
        "{amount} tetrahedra exceed the maximum of {MAX_TETRAHEDRA}"
    );

    let mut mesh = Mesh {
        positions: vec![Float3::ZERO; amount * TET_VERTEX_COUNT],
        normals: vec![[0; 3]; amount * TET_VERTEX_COUNT],
        edges: vec![[0; 2]; amount * TET_EDGE_COUNT],
        polys: vec![MeshPoly::default(); amount * TET_POLY_COUNT],
        loops: vec![MeshLoop::default(); amount * TET_LOOP_COUNT],
        loop_colors: vec![Rgba8::default(); amount * TET_LOOP_COUNT],
    };
    if amount == 0 {
        return mesh;
    }

    mesh.positions
        .par_chunks_mut(INSTANCES_PER_TASK * TET_VERTEX_COUNT)
        .zip(mesh.edges.par_chunks_mut(INSTANCES_PER_TASK * TET_EDGE_COUNT))
        .zip(mesh.polys.par_chunks_mut(INSTANCES_PER_TASK * TET_POLY_COUNT))
        .zip(mesh.loops.par_chunks_mut(INSTANCES_PER_TASK * TET_LOOP_COUNT))
        .zip(mesh.loop_colors.par_chunks_mut(INSTANCES_PER_TASK * TET_LOOP_COUNT))
        .enumerate()
        .for_each(|(task, ((((positions, edges), polys), loops), loop_colors))| {
            let first = task * INSTANCES_PER_TASK;
            let count = positions.len() / TET_VERTEX_COUNT;
            let mut out = TetSlices {
                positions,
                edges,
                polys,
                loops,
                loop_colors,
            };
            for local in 0..count {
                let instance = first + local;
                write_tetrahedron(
                    instance,
                    local,
                    centers[instance],
                    scales[instance],
                    colors[instance],
                    &mut out,
                );
            }
        });

    tracing::trace!(instances = amount, "built tetrahedra mesh");
    mesh
}

struct TetSlices<'a> {
    positions: &'a mut [Float3],
    edges: &'a mut [[u32; 2]],
    polys: &'a mut [MeshPoly],
    loops: &'a mut [MeshLoop],
    loop_colors: &'a mut [Rgba8],
}

/// Write instance `instance` at local position `local` of a task's slices.
fn write_tetrahedron(
    instance: usize,
    local: usize,
    center: Float3,
    scale: f32,
    color: Rgba,
    out: &mut TetSlices<'_>,
) {
    let vertex_offset = (instance * TET_VERTEX_COUNT) as u32;
    let edge_offset = (instance * TET_EDGE_COUNT) as u32;
    let loop_offset = (instance * TET_LOOP_COUNT) as u32;

    let positions = &mut out.positions[local * TET_VERTEX_COUNT..][..TET_VERTEX_COUNT];
    for (dst, corner) in positions.iter_mut().zip(TET_VERTICES) {
        *dst = center + corner * scale;
    }

    let polys = &mut out.polys[local * TET_POLY_COUNT..][..TET_POLY_COUNT];
    for ((dst, start), len) in polys.iter_mut().zip(TET_LOOP_STARTS).zip(TET_LOOP_LENGTHS) {
        *dst = MeshPoly {
            loop_start: loop_offset + start,
            loop_count: len,
        };
    }

    let color = Rgba8::from(color);
    let loops = &mut out.loops[local * TET_LOOP_COUNT..][..TET_LOOP_COUNT];
    let loop_colors = &mut out.loop_colors[local * TET_LOOP_COUNT..][..TET_LOOP_COUNT];
    for (i, (dst, dst_color)) in loops.iter_mut().zip(loop_colors.iter_mut()).enumerate() {
        *dst = MeshLoop {
            vertex: vertex_offset + TET_LOOP_VERTICES[i],
            edge: edge_offset + TET_LOOP_EDGES[i],
        };
        *dst_color = color;
    }

    let edges = &mut out.edges[local * TET_EDGE_COUNT..][..TET_EDGE_COUNT];
    for (dst, [a, b]) in edges.iter_mut().zip(TET_EDGES) {
        *dst = [vertex_offset + a, vertex_offset + b];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_give_empty_meshes() {
        assert!(points_mesh(&[]).is_empty());
        let mesh = tetrahedra_mesh(&[], &[], &[]);
        assert!(mesh.is_empty());
        assert!(mesh.loops().is_empty());
    }

    #[test]
    fn points_point_up() {
        let mesh = points_mesh(&[Float3::new(1.0, 2.0, 3.0), Float3::ZERO]);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.normals(), &[UP_NORMAL, UP_NORMAL]);
        assert!(mesh.edges().is_empty());
        assert!(mesh.polys().is_empty());
    }

    #[test]
    fn single_tetrahedron_layout() {
        let mesh = tetrahedra_mesh(
            &[Float3::new(10.0, 0.0, 0.0)],
            &[0.5],
            &[Rgba::new(1.0, 0.0, 0.0, 1.0)],
        );
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edges().len(), 6);
        assert_eq!(mesh.polys().len(), 4);
        assert_eq!(mesh.loops().len(), 12);
        assert_eq!(mesh.positions()[0], Float3::new(10.5, -0.5, -0.5));
        assert_eq!(mesh.positions()[3], Float3::new(9.5, 0.5, -0.5));
        assert_eq!(mesh.polys()[2], MeshPoly { loop_start: 6, loop_count: 3 });
        assert_eq!(mesh.loops()[4], MeshLoop { vertex: 3, edge: 4 });
        assert_eq!(mesh.edges()[5], [2, 3]);
        assert!(mesh
            .loop_colors()
            .iter()
            .all(|&c| c == Rgba8::new(255, 0, 0, 255)));
    }

    #[test]
    fn later_instances_are_offset() {
        let centers = vec![Float3::ZERO; 3];
        let mesh = tetrahedra_mesh(&centers, &[1.0; 3], &[Rgba::WHITE; 3]);
        assert_eq!(mesh.polys()[8], MeshPoly { loop_start: 24, loop_count: 3 });
        assert_eq!(mesh.loops()[24], MeshLoop { vertex: 8, edge: 12 });
        assert_eq!(mesh.edges()[12], [8, 9]);
    }

    #[test]
    fn loops_reference_their_own_edges() {
        let centers = vec![Float3::ZERO; 2];
        let mesh = tetrahedra_mesh(&centers, &[1.0; 2], &[Rgba::WHITE; 2]);
        for poly in mesh.polys() {
            let start = poly.loop_start as usize;
            let count = poly.loop_count as usize;
            for k in 0..count {
                let this = mesh.loops()[start + k];
                let next = mesh.loops()[start + (k + 1) % count];
                let mut edge = mesh.edges()[this.edge as usize];
                edge.sort_unstable();
                let mut expected = [this.vertex, next.vertex];
                expected.sort_unstable();
                assert_eq!(edge, expected);
            }
        }
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn mismatched_inputs_panic() {
        tetrahedra_mesh(&[Float3::ZERO; 2], &[1.0], &[Rgba::WHITE; 2]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn parallel_build_matches_instance_formula(amount in 0usize..2500) {
                let centers: Vec<Float3> =
                    (0..amount).map(|i| Float3::splat(i as f32)).collect();
                let scales: Vec<f32> = (0..amount).map(|i| (i % 7) as f32).collect();
                let colors = vec![Rgba::WHITE; amount];
                let mesh = tetrahedra_mesh(&centers, &scales, &colors);

                prop_assert_eq!(mesh.vertex_count(), amount * TET_VERTEX_COUNT);
                prop_assert_eq!(mesh.loops().len(), amount * TET_LOOP_COUNT);
                for i in 0..amount {
                    let v = i * TET_VERTEX_COUNT;
                    prop_assert_eq!(mesh.positions()[v + 1], centers[i] + Float3::splat(scales[i]));
                    let l = i * TET_LOOP_COUNT;
                    prop_assert_eq!(mesh.loops()[l].vertex as usize, v);
                    prop_assert_eq!(mesh.polys()[i * TET_POLY_COUNT].loop_start as usize, l);
                }
            }
        }
    }
}
