// obj.rs       Wavefront OBJ reader
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::Result;
use crate::mesh::{GenericAttribute, Mesh, MeshBuilder};
use glam::{Vec2, Vec3};
use std::io::BufRead;

/// Make load options: one index per corner, polygons as triangles
fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Parse an OBJ mesh
///
/// All objects / groups are merged into one mesh.  Materials are not loaded.
pub fn parse<R: BufRead>(mut reader: R) -> Result<Mesh> {
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &load_options(), |_| {
            Ok((Vec::new(), Default::default()))
        })?;
    let mut builder = Mesh::builder();
    let mut colors = GenericAttribute::new("color", 3, Vec::new());
    for model in &models {
        tracing::trace!(
            "object {}: {} indices",
            model.name,
            model.mesh.indices.len()
        );
        push_model(&mut builder, &mut colors, &model.mesh)?;
    }
    if !colors.values().is_empty() {
        builder.push_generic(colors);
    }
    builder.build()
}

/// Append one loaded model to a mesh builder
fn push_model(
    builder: &mut MeshBuilder,
    colors: &mut GenericAttribute,
    mesh: &tobj::Mesh,
) -> Result<()> {
    let base = builder.vertex_count();
    for p in mesh.positions.chunks_exact(3) {
        builder.push_vtx(Vec3::new(p[0], p[1], p[2]));
    }
    for uv in mesh.texcoords.chunks_exact(2) {
        builder.push_uv(Vec2::new(uv[0], uv[1]));
    }
    for n in mesh.normals.chunks_exact(3) {
        builder.push_norm(Vec3::new(n[0], n[1], n[2]));
    }
    for c in mesh.vertex_color.chunks_exact(3) {
        colors.push(c);
    }
    for tri in mesh.indices.chunks_exact(3) {
        builder.push_face([
            base + tri[0] as usize,
            base + tri[1] as usize,
            base + tri[2] as usize,
        ])?;
    }
    Ok(())
}
