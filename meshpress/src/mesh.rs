// mesh.rs      Mesh module
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::{Error, Result};
use glam::{Vec2, Vec3};
use std::fmt;

/// Class of a vertex attribute
///
/// Each class has its own quantization setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    /// Vertex position
    Position,

    /// Texture coordinate
    TexCoord,

    /// Vertex normal
    Normal,

    /// Any other attribute (colors, weights, ...)
    Generic,
}

/// Generic vertex attribute
///
/// Values are stored flat, `components` values per vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericAttribute {
    /// Attribute name
    name: String,

    /// Number of components per vertex
    components: usize,

    /// Flat attribute values
    values: Vec<f32>,
}

/// Mesh builder
#[derive(Default)]
pub struct MeshBuilder {
    /// Vertex positions
    pos: Vec<Vec3>,

    /// Texture coordinates
    uv: Vec<Vec2>,

    /// Vertex normals
    norm: Vec<Vec3>,

    /// Generic attributes
    generic: Vec<GenericAttribute>,

    /// Triangle vertex indices
    indices: Vec<u32>,
}

/// 3D triangle mesh
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pos: Vec<Vec3>,

    /// Texture coordinates (empty or one per vertex)
    uv: Vec<Vec2>,

    /// Vertex normals (empty or one per vertex)
    norm: Vec<Vec3>,

    /// Generic attributes
    generic: Vec<GenericAttribute>,

    /// Triangle vertex indices
    indices: Vec<u32>,
}

impl AttributeKind {
    /// All attribute classes
    pub const ALL: [AttributeKind; 4] = [
        AttributeKind::Position,
        AttributeKind::TexCoord,
        AttributeKind::Normal,
        AttributeKind::Generic,
    ];

    /// Get index into per-class settings
    pub(crate) fn index(self) -> usize {
        match self {
            AttributeKind::Position => 0,
            AttributeKind::TexCoord => 1,
            AttributeKind::Normal => 2,
            AttributeKind::Generic => 3,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeKind::Position => write!(f, "position"),
            AttributeKind::TexCoord => write!(f, "texture coordinate"),
            AttributeKind::Normal => write!(f, "normal"),
            AttributeKind::Generic => write!(f, "generic"),
        }
    }
}

impl GenericAttribute {
    /// Create a new generic attribute
    pub fn new(name: &str, components: usize, values: Vec<f32>) -> Self {
        GenericAttribute {
            name: name.into(),
            components,
            values,
        }
    }

    /// Get attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get number of components per vertex
    pub fn components(&self) -> usize {
        self.components
    }

    /// Get flat slice of values
    pub fn values(&self) -> &[f32] {
        &self.values[..]
    }

    /// Push values for one vertex
    pub fn push(&mut self, vals: &[f32]) {
        debug_assert_eq!(vals.len(), self.components);
        self.values.extend_from_slice(vals);
    }
}

impl MeshBuilder {
    /// Get number of vertices pushed
    pub fn vertex_count(&self) -> usize {
        self.pos.len()
    }

    /// Push a vertex position
    pub fn push_vtx(&mut self, pos: Vec3) -> usize {
        let idx = self.pos.len();
        self.pos.push(pos);
        idx
    }

    /// Push a texture coordinate
    pub fn push_uv(&mut self, uv: Vec2) {
        self.uv.push(uv);
    }

    /// Push a vertex normal
    pub fn push_norm(&mut self, norm: Vec3) {
        self.norm.push(norm);
    }

    /// Add a generic attribute
    pub fn push_generic(&mut self, attr: GenericAttribute) {
        self.generic.push(attr);
    }

    /// Push a triangle face
    pub fn push_face(&mut self, vtx: [usize; 3]) -> Result<()> {
        for v in vtx {
            let v = u32::try_from(v)
                .map_err(|_| Error::InvalidAttribute("Too many vertices".into()))?;
            self.indices.push(v);
        }
        Ok(())
    }

    /// Push a polygon face, as a triangle fan
    pub fn push_polygon(&mut self, vtx: &[usize]) -> Result<()> {
        for i in 1..vtx.len().saturating_sub(1) {
            self.push_face([vtx[0], vtx[i], vtx[i + 1]])?;
        }
        Ok(())
    }

    /// Build the mesh
    pub fn build(self) -> Result<Mesh> {
        let count = self.pos.len();
        if count == 0 || self.indices.is_empty() {
            return Err(Error::EmptyMesh);
        }
        if !self.uv.is_empty() && self.uv.len() != count {
            return Err(Error::InvalidAttribute(format!(
                "{} texture coordinates for {count} vertices",
                self.uv.len()
            )));
        }
        if !self.norm.is_empty() && self.norm.len() != count {
            return Err(Error::InvalidAttribute(format!(
                "{} normals for {count} vertices",
                self.norm.len()
            )));
        }
        for attr in &self.generic {
            if attr.components == 0
                || attr.values.len() != attr.components * count
            {
                return Err(Error::InvalidAttribute(format!(
                    "{}: {} values for {count} vertices",
                    attr.name,
                    attr.values.len()
                )));
            }
        }
        if let Some(idx) = self.indices.iter().find(|i| **i as usize >= count)
        {
            return Err(Error::InvalidAttribute(format!(
                "Vertex index {idx} out of range"
            )));
        }
        Ok(Mesh {
            pos: self.pos,
            uv: self.uv,
            norm: self.norm,
            generic: self.generic,
            indices: self.indices,
        })
    }
}

impl Mesh {
    /// Create a new mesh builder
    pub fn builder() -> MeshBuilder {
        MeshBuilder::default()
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.pos.len()
    }

    /// Get number of triangle faces
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get slice of all vertex positions
    pub fn positions(&self) -> &[Vec3] {
        &self.pos[..]
    }

    /// Get slice of all texture coordinates
    pub fn tex_coords(&self) -> &[Vec2] {
        &self.uv[..]
    }

    /// Get slice of all vertex normals
    pub fn normals(&self) -> &[Vec3] {
        &self.norm[..]
    }

    /// Get slice of generic attributes
    pub fn generic(&self) -> &[GenericAttribute] {
        &self.generic[..]
    }

    /// Get slice of vertex indices for all triangles
    pub fn indices(&self) -> &[u32] {
        &self.indices[..]
    }

    /// Check whether the mesh has an attribute class
    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::Position => !self.pos.is_empty(),
            AttributeKind::TexCoord => !self.uv.is_empty(),
            AttributeKind::Normal => !self.norm.is_empty(),
            AttributeKind::Generic => !self.generic.is_empty(),
        }
    }

    /// Get minimum position
    pub fn pos_min(&self) -> Vec3 {
        self.pos.iter().copied().fold(Vec3::splat(f32::MAX), Vec3::min)
    }

    /// Get maximum position
    pub fn pos_max(&self) -> Vec3 {
        self.pos.iter().copied().fold(Vec3::splat(f32::MIN), Vec3::max)
    }

}
