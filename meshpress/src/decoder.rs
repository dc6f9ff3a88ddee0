// decoder.rs   Mesh decoder module
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::{Error, Result};
use crate::mesh::{GenericAttribute, Mesh};
use draco_core::decoder_buffer::DecoderBuffer;
use draco_core::draco_types::DataType;
use draco_core::geometry_attribute::{GeometryAttributeType, PointAttribute};
use draco_core::geometry_indices::FaceIndex;
use draco_core::mesh::Mesh as DracoMesh;
use draco_core::mesh_decoder::MeshDecoder;
use glam::{Vec2, Vec3};
use std::path::Path;

/// Draco stream magic
const MAGIC: &[u8] = b"DRACO";

/// Decode a compressed mesh
pub fn decode(data: &[u8]) -> Result<Mesh> {
    if !data.starts_with(MAGIC) {
        return Err(Error::decode("Not a Draco stream"));
    }
    let mut draco = DracoMesh::new();
    let mut buffer = DecoderBuffer::new(data);
    MeshDecoder::new()
        .decode(&mut buffer, &mut draco)
        .map_err(Error::draco)?;
    let mesh = convert(&draco)?;
    tracing::debug!(
        "decoded {} vertices, {} faces from {} bytes",
        mesh.vertex_count(),
        mesh.face_count(),
        data.len()
    );
    Ok(mesh)
}

/// Decode a compressed mesh file
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    decode(&std::fs::read(path)?)
}

/// Convert a decoded Draco mesh
fn convert(draco: &DracoMesh) -> Result<Mesh> {
    let count = draco.num_points() as usize;
    let mut builder = Mesh::builder();
    let mut generic = 0;
    for i in 0..draco.num_attributes() {
        let att = draco.attribute(i as i32);
        let components = att.num_components() as usize;
        let values = float_values(att, count, components)?;
        match (att.attribute_type(), components) {
            (GeometryAttributeType::Position, 3) => {
                for p in values.chunks_exact(3) {
                    builder.push_vtx(Vec3::new(p[0], p[1], p[2]));
                }
            }
            (GeometryAttributeType::TexCoord, 2) => {
                for uv in values.chunks_exact(2) {
                    builder.push_uv(Vec2::new(uv[0], uv[1]));
                }
            }
            (GeometryAttributeType::Normal, 3) => {
                for n in values.chunks_exact(3) {
                    builder.push_norm(Vec3::new(n[0], n[1], n[2]));
                }
            }
            (GeometryAttributeType::Position, _)
            | (GeometryAttributeType::TexCoord, _)
            | (GeometryAttributeType::Normal, _) => {
                return Err(Error::decode(format!(
                    "Attribute {i}: {components} components"
                )));
            }
            _ => {
                let name = format!("generic{generic}");
                generic += 1;
                builder.push_generic(GenericAttribute::new(
                    &name, components, values,
                ));
            }
        }
    }
    if builder.vertex_count() != count {
        return Err(Error::decode("Missing position attribute"));
    }
    for f in 0..draco.num_faces() {
        let face = draco.face(FaceIndex(f as u32));
        let mut tri = [0; 3];
        for (t, p) in tri.iter_mut().zip(face.iter()) {
            *t = p.0 as usize;
        }
        builder.push_face(tri)?;
    }
    builder.build()
}

/// Get float values of a decoded attribute
fn float_values(
    att: &PointAttribute,
    count: usize,
    components: usize,
) -> Result<Vec<f32>> {
    if att.data_type() != DataType::Float32 {
        return Err(Error::decode("Attribute is not float"));
    }
    if components == 0 || att.size() != count {
        return Err(Error::decode(format!(
            "{} values for {count} points",
            att.size()
        )));
    }
    let len = count
        .checked_mul(components)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .ok_or_else(|| Error::decode("Point count too large"))?;
    let bytes = att
        .buffer()
        .data()
        .get(..len)
        .ok_or_else(|| Error::decode("Attribute buffer too short"))?;
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
