// encoder.rs   Mesh encoder module
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::{Error, Result};
use crate::mesh::{AttributeKind, Mesh};
use draco_core::draco_types::DataType;
use draco_core::encoder_buffer::EncoderBuffer;
use draco_core::encoder_options::EncoderOptions;
use draco_core::geometry_attribute::{GeometryAttributeType, PointAttribute};
use draco_core::geometry_indices::PointIndex;
use draco_core::mesh::Mesh as DracoMesh;
use draco_core::mesh_encoder::MeshEncoder as DracoMeshEncoder;

/// Maximum speed setting
pub const MAX_SPEED: i32 = 10;

/// Range of valid quantization bits
pub const QUANTIZATION_BITS: std::ops::RangeInclusive<i32> = 1..=30;

/// Draco sequential connectivity encoding
const SEQUENTIAL_ENCODING: i32 = 0;

/// Draco edgebreaker connectivity encoding
const EDGEBREAKER_ENCODING: i32 = 1;

/// Encoder configuration
///
/// Values are passed through as given; the encoder validates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Quantization bits, indexed by attribute class
    quantization: [i32; 4],

    /// Encoding speed (0: slowest / smallest, 10: fastest)
    encoding_speed: i32,

    /// Decoding speed (0: slowest / smallest, 10: fastest)
    decoding_speed: i32,
}

/// Capability to encode a mesh into a byte buffer
pub trait MeshEncoder {
    /// Encode a mesh
    fn encode_mesh(&self, mesh: &Mesh, config: &EncoderConfig)
        -> Result<Vec<u8>>;
}

/// Draco mesh encoder
#[derive(Clone, Copy, Debug, Default)]
pub struct DracoEncoder;

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            quantization: [11, 10, 8, 8],
            encoding_speed: 3,
            decoding_speed: 3,
        }
    }
}

impl EncoderConfig {
    /// Set quantization bits for an attribute class
    pub fn set_attribute_quantization(
        &mut self,
        kind: AttributeKind,
        bits: i32,
    ) {
        self.quantization[kind.index()] = bits;
    }

    /// Get quantization bits for an attribute class
    pub fn attribute_quantization(&self, kind: AttributeKind) -> i32 {
        self.quantization[kind.index()]
    }

    /// Set encoding and decoding speed
    pub fn set_speed_options(&mut self, encoding: i32, decoding: i32) {
        self.encoding_speed = encoding;
        self.decoding_speed = decoding;
    }

    /// Get encoding speed
    pub fn encoding_speed(&self) -> i32 {
        self.encoding_speed
    }

    /// Get decoding speed
    pub fn decoding_speed(&self) -> i32 {
        self.decoding_speed
    }

    /// Get connectivity encoding method
    ///
    /// Only the fastest setting selects sequential encoding.
    fn encoding_method(&self) -> i32 {
        if self.encoding_speed.max(self.decoding_speed) == MAX_SPEED {
            SEQUENTIAL_ENCODING
        } else {
            EDGEBREAKER_ENCODING
        }
    }

    /// Validate settings for a mesh
    fn validate(&self, mesh: &Mesh) -> Result<()> {
        for speed in [self.encoding_speed, self.decoding_speed] {
            if !(0..=MAX_SPEED).contains(&speed) {
                return Err(Error::InvalidSpeed(speed));
            }
        }
        for kind in AttributeKind::ALL {
            let bits = self.attribute_quantization(kind);
            if mesh.has_attribute(kind) && !QUANTIZATION_BITS.contains(&bits) {
                return Err(Error::InvalidQuantization(kind, bits));
            }
        }
        Ok(())
    }

    /// Make Draco encoder options for a Draco mesh
    fn draco_options(&self, mesh: &DracoMesh) -> EncoderOptions {
        let mut options = EncoderOptions::new();
        options.set_global_int("encoding_speed", self.encoding_speed);
        options.set_global_int("decoding_speed", self.decoding_speed);
        options.set_global_int("encoding_method", self.encoding_method());
        for i in 0..mesh.num_attributes() {
            let att = mesh.attribute(i as i32);
            let kind = match att.attribute_type() {
                GeometryAttributeType::Position => AttributeKind::Position,
                GeometryAttributeType::TexCoord => AttributeKind::TexCoord,
                GeometryAttributeType::Normal => AttributeKind::Normal,
                _ => AttributeKind::Generic,
            };
            let bits = self.attribute_quantization(kind);
            options.set_attribute_int(i as i32, "quantization_bits", bits);
        }
        options
    }
}

impl<T: MeshEncoder + ?Sized> MeshEncoder for &T {
    fn encode_mesh(
        &self,
        mesh: &Mesh,
        config: &EncoderConfig,
    ) -> Result<Vec<u8>> {
        (**self).encode_mesh(mesh, config)
    }
}

/// Make a float attribute with `components` values per vertex
fn float_attribute(
    att_type: GeometryAttributeType,
    components: usize,
    values: &[f32],
) -> PointAttribute {
    let count = values.len() / components;
    let stride = components * std::mem::size_of::<f32>();
    let mut att = PointAttribute::new();
    att.init(att_type, components as _, DataType::Float32, false, count);
    let buffer = att.buffer_mut();
    for (i, vtx) in values.chunks_exact(components).enumerate() {
        let bytes: Vec<u8> = vtx.iter().flat_map(|v| v.to_le_bytes()).collect();
        buffer.write(i * stride, &bytes);
    }
    att
}

/// Convert a mesh to a Draco mesh
pub(crate) fn draco_mesh(mesh: &Mesh) -> DracoMesh {
    let mut draco = DracoMesh::new();
    let pos: Vec<f32> =
        mesh.positions().iter().flat_map(|p| p.to_array()).collect();
    draco.add_attribute(float_attribute(
        GeometryAttributeType::Position,
        3,
        &pos,
    ));
    if mesh.has_attribute(AttributeKind::TexCoord) {
        let uv: Vec<f32> =
            mesh.tex_coords().iter().flat_map(|uv| uv.to_array()).collect();
        draco.add_attribute(float_attribute(
            GeometryAttributeType::TexCoord,
            2,
            &uv,
        ));
    }
    if mesh.has_attribute(AttributeKind::Normal) {
        let norm: Vec<f32> =
            mesh.normals().iter().flat_map(|n| n.to_array()).collect();
        draco.add_attribute(float_attribute(
            GeometryAttributeType::Normal,
            3,
            &norm,
        ));
    }
    for attr in mesh.generic() {
        draco.add_attribute(float_attribute(
            GeometryAttributeType::Generic,
            attr.components(),
            attr.values(),
        ));
    }
    for tri in mesh.indices().chunks_exact(3) {
        draco.add_face([
            PointIndex(tri[0]),
            PointIndex(tri[1]),
            PointIndex(tri[2]),
        ]);
    }
    draco
}

impl MeshEncoder for DracoEncoder {
    fn encode_mesh(
        &self,
        mesh: &Mesh,
        config: &EncoderConfig,
    ) -> Result<Vec<u8>> {
        config.validate(mesh)?;
        let draco = draco_mesh(mesh);
        let options = config.draco_options(&draco);
        let mut encoder = DracoMeshEncoder::new();
        let mut buffer = EncoderBuffer::new();
        encoder.set_mesh(draco);
        encoder.encode(&options, &mut buffer).map_err(Error::draco)?;
        let data = buffer.data().to_vec();
        tracing::debug!(
            "encoded {} vertices, {} faces: {} bytes",
            mesh.vertex_count(),
            mesh.face_count(),
            data.len()
        );
        Ok(data)
    }
}
