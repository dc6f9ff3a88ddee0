// mesh.rs      Bevy mesh conversion
//
// Copyright (c) 2024  meshpress contributors
//
use bevy::math::Vec3;
use bevy::render::mesh::{Indices, Mesh};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::PrimitiveTopology;

/// Triangle for mesh
#[derive(Clone, Copy, Debug)]
struct Tri {
    pos: [Vec3; 3],
    norm: [Vec3; 3],
    uv: [[f32; 2]; 3],
}

/// Builder for bevy Mesh with TriangleList primitives
#[derive(Default)]
struct MeshBuilder {
    pos: Vec<[f32; 3]>,
    norm: Vec<[f32; 3]>,
    uv: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Tri {
    /// Create a new flat-shaded triangle
    fn new(pos: [Vec3; 3], uv: [[f32; 2]; 3]) -> Self {
        let norm = (pos[0] - pos[1]).cross(pos[0] - pos[2]).normalize_or_zero();
        Tri {
            pos,
            norm: [norm; 3],
            uv,
        }
    }
}

impl MeshBuilder {
    /// Push one vertex
    fn push_vtx(&mut self, pos: Vec3, norm: Vec3, uv: [f32; 2]) {
        self.indices.push(self.pos.len() as u32);
        self.pos.push(pos.to_array());
        self.norm.push(norm.to_array());
        self.uv.push(uv);
    }

    /// Push one triangle face
    fn push_tri(&mut self, tri: Tri) {
        for i in 0..3 {
            self.push_vtx(tri.pos[i], tri.norm[i], tri.uv[i]);
        }
    }

    /// Build the mesh
    fn build(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.pos);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.norm);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uv);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

/// Get texture coordinate of a vertex (zero when absent)
fn uv_at(src: &meshpress::Mesh, idx: usize) -> [f32; 2] {
    src.tex_coords()
        .get(idx)
        .map(|uv| uv.to_array())
        .unwrap_or_default()
}

/// Build a bevy mesh from a decoded mesh
///
/// Meshes without normals are flat shaded.
pub fn build_mesh(src: &meshpress::Mesh) -> Mesh {
    let pos = |i: usize| Vec3::from_array(src.positions()[i].to_array());
    let mut builder = MeshBuilder::default();
    if src.normals().is_empty() {
        for tri in src.indices().chunks_exact(3) {
            let vtx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            builder.push_tri(Tri::new(
                vtx.map(pos),
                vtx.map(|i| uv_at(src, i)),
            ));
        }
    } else {
        for i in 0..src.vertex_count() {
            builder.pos.push(src.positions()[i].to_array());
            builder.norm.push(src.normals()[i].to_array());
            builder.uv.push(uv_at(src, i));
        }
        builder.indices.extend_from_slice(src.indices());
    }
    builder.build()
}
