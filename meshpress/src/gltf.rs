// gltf.rs      glTF module
//
// Copyright (c) 2024  meshpress contributors
//
use crate::mesh::Mesh;
use serde_json::{json, Map, Value};
use serde_repr::Serialize_repr;
use std::io::{Result, Write};
use std::mem::size_of;

/// Component types for glTF accessor
#[derive(Serialize_repr)]
#[repr(u32)]
#[allow(unused)]
enum ComponentType {
    I8 = 5120,
    U8 = 5121,
    I16 = 5122,
    U16 = 5123,
    U32 = 5125,
    F32 = 5126,
}

/// Target for glTF buffer view
#[derive(Serialize_repr)]
#[repr(u32)]
enum Target {
    ArrayBuffer = 34962,
    ElementArrayBuffer = 34963,
}

/// Builder for glTF
#[derive(Default)]
struct Builder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
}

/// GLB writer
struct Glb<W: Write> {
    writer: W,
}

/// Transmute a slice of `T` to a slice of `u8`
fn as_u8_slice<T: Sized>(p: &[T]) -> &[u8] {
    let (_head, body, _tail) = unsafe { p.align_to::<u8>() };
    body
}

/// Get accessor type for a number of components
fn accessor_type(components: usize) -> Option<&'static str> {
    match components {
        1 => Some("SCALAR"),
        2 => Some("VEC2"),
        3 => Some("VEC3"),
        4 => Some("VEC4"),
        _ => None,
    }
}

impl Builder {
    /// Add a mesh
    fn add_mesh(&mut self, mesh: &Mesh) {
        let count = mesh.vertex_count();
        let mut attributes = Map::new();
        // indices
        let idx_view = self.push_view(as_u8_slice(mesh.indices()), None);
        let idx_accessor = self.push_accessor(json!({
            "bufferView": idx_view,
            "componentType": ComponentType::U32,
            "type": "SCALAR",
            "count": mesh.indices().len(),
        }));
        // positions
        let view = self.push_view(
            as_u8_slice(mesh.positions()),
            Some(3 * size_of::<f32>()),
        );
        let acc = self.push_accessor(json!({
            "bufferView": view,
            "componentType": ComponentType::F32,
            "type": "VEC3",
            "count": count,
            "min": mesh.pos_min(),
            "max": mesh.pos_max(),
        }));
        attributes.insert("POSITION".into(), acc.into());
        if !mesh.normals().is_empty() {
            let view = self.push_view(
                as_u8_slice(mesh.normals()),
                Some(3 * size_of::<f32>()),
            );
            let acc = self.push_float_accessor(view, "VEC3", count);
            attributes.insert("NORMAL".into(), acc.into());
        }
        if !mesh.tex_coords().is_empty() {
            let view = self.push_view(
                as_u8_slice(mesh.tex_coords()),
                Some(2 * size_of::<f32>()),
            );
            let acc = self.push_float_accessor(view, "VEC2", count);
            attributes.insert("TEXCOORD_0".into(), acc.into());
        }
        for attr in mesh.generic() {
            // application-specific attributes are prefixed with underscore
            if let Some(atype) = accessor_type(attr.components()) {
                let view = self.push_view(
                    as_u8_slice(attr.values()),
                    Some(attr.components() * size_of::<f32>()),
                );
                let acc = self.push_float_accessor(view, atype, count);
                let name = format!("_{}", attr.name().to_ascii_uppercase());
                attributes.insert(name, acc.into());
            } else {
                tracing::warn!(
                    "skipping generic attribute {}: {} components",
                    attr.name(),
                    attr.components()
                );
            }
        }
        self.meshes.push(json!({
            "primitives": [{
                "attributes": attributes,
                "indices": idx_accessor,
            }],
        }));
    }

    /// Push an accessor
    fn push_accessor(&mut self, accessor: Value) -> usize {
        let idx = self.accessors.len();
        self.accessors.push(accessor);
        idx
    }

    /// Push a float vertex attribute accessor
    fn push_float_accessor(
        &mut self,
        view: usize,
        atype: &str,
        count: usize,
    ) -> usize {
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": ComponentType::F32,
            "type": atype,
            "count": count,
        }))
    }

    /// Push a buffer view (index view when no stride)
    fn push_view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let byte_offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        let view = match stride {
            Some(stride) => json!({
                "buffer": 0,
                "byteLength": bytes.len(),
                "byteOffset": byte_offset,
                "byteStride": stride,
                "target": Target::ArrayBuffer,
            }),
            None => json!({
                "buffer": 0,
                "byteLength": bytes.len(),
                "byteOffset": byte_offset,
                "target": Target::ElementArrayBuffer,
            }),
        };
        let idx = self.views.len();
        self.views.push(view);
        idx
    }

    /// Get root JSON of glTF
    fn json(&self) -> Value {
        json!({
            "asset": {
                "version": "2.0",
                "generator": "meshpress",
            },
            "buffers": [{
                "byteLength": self.bin.len(),
            }],
            "bufferViews": self.views,
            "accessors": self.accessors,
            "meshes": self.meshes,
            "nodes": [{
                "mesh": 0
            }],
            "scenes": [{
                "nodes": [0]
            }],
        })
    }
}

/// Export a mesh to a writer as a GLB
pub fn export<W: Write>(writer: W, mesh: &Mesh) -> Result<()> {
    let mut builder = Builder::default();
    builder.add_mesh(mesh);
    while builder.bin.len() % 4 != 0 {
        builder.bin.push(0);
    }
    let mut root_json = builder.json().to_string();
    while root_json.len() % 4 != 0 {
        root_json.push(' ');
    }
    let len = u32::try_from(root_json.len() + builder.bin.len())
        .map_err(|_| std::io::Error::other("GLB too large"))?;
    let mut glb = Glb { writer };
    glb.write_header(2, len)?;
    glb.write_chunk(b"JSON", root_json.as_bytes())?;
    glb.write_chunk(b"BIN\0", &builder.bin)?;
    Ok(())
}

impl<W: Write> Glb<W> {
    /// Write GLB header
    fn write_header(&mut self, chunks: u32, len: u32) -> Result<()> {
        let total_len = 12 + chunks * 8 + len;
        self.writer.write_all(b"glTF")?;
        self.writer.write_all(&2u32.to_le_bytes())?;
        self.writer.write_all(&total_len.to_le_bytes())?;
        Ok(())
    }

    /// Write one chunk
    fn write_chunk(&mut self, ctype: &[u8], data: &[u8]) -> Result<()> {
        let len = data.len() as u32;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(ctype)?;
        self.writer.write_all(data)?;
        Ok(())
    }
}
