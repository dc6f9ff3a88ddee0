// ply.rs       Stanford PLY reader
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::{Error, Result};
use crate::mesh::{GenericAttribute, Mesh, MeshBuilder};
use glam::{Vec2, Vec3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, ElementDef, Property, PropertyType};
use std::io::Read;

/// Texture coordinate property name pairs
const UV_NAMES: [(&str, &str); 4] = [
    ("s", "t"),
    ("u", "v"),
    ("texture_u", "texture_v"),
    ("texture_s", "texture_t"),
];

/// Color property names
const COLOR_NAMES: [&str; 4] = ["red", "green", "blue", "alpha"];

/// Face index list property names
const INDEX_NAMES: [&str; 2] = ["vertex_indices", "vertex_index"];

/// Vertex property layout
#[derive(Default)]
struct VertexLayout<'a> {
    norm: Option<[&'a str; 3]>,
    uv: Option<[&'a str; 2]>,
    color: Vec<&'a str>,
    other: Vec<&'a str>,
}

/// Get a scalar property as `f32`
fn scalar(prop: &Property) -> Option<f32> {
    match *prop {
        Property::Char(v) => Some(f32::from(v)),
        Property::UChar(v) => Some(f32::from(v)),
        Property::Short(v) => Some(f32::from(v)),
        Property::UShort(v) => Some(f32::from(v)),
        Property::Int(v) => Some(v as f32),
        Property::UInt(v) => Some(v as f32),
        Property::Float(v) => Some(v),
        Property::Double(v) => Some(v as f32),
        _ => None,
    }
}

/// Get a list property as vertex indices
fn index_list(prop: &Property) -> Option<Vec<usize>> {
    fn conv<T: Copy>(vals: &[T]) -> Option<Vec<usize>>
    where
        usize: TryFrom<T>,
    {
        vals.iter().map(|v| usize::try_from(*v).ok()).collect()
    }
    match prop {
        Property::ListChar(v) => conv(v),
        Property::ListUChar(v) => conv(v),
        Property::ListShort(v) => conv(v),
        Property::ListUShort(v) => conv(v),
        Property::ListInt(v) => conv(v),
        Property::ListUInt(v) => conv(v),
        _ => None,
    }
}

/// Parse a PLY mesh (ASCII or binary)
///
/// Polygons are triangulated as fans.
pub fn parse<R: Read>(mut reader: R) -> Result<Mesh> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader).map_err(Error::Ply)?;
    let vertex_def = ply
        .header
        .elements
        .get("vertex")
        .ok_or_else(|| Error::InvalidAttribute("No vertex element".into()))?;
    let layout = VertexLayout::new(vertex_def)?;
    let mut builder = Mesh::builder();
    let mut generic = layout.generic_attributes();
    if let Some(vertices) = ply.payload.get("vertex") {
        for vtx in vertices {
            layout.push_vertex(vtx, &mut builder, &mut generic)?;
        }
    }
    if let Some(faces) = ply.payload.get("face") {
        for face in faces {
            let vtx = INDEX_NAMES
                .iter()
                .find_map(|n| face.get(*n))
                .and_then(index_list)
                .ok_or_else(|| {
                    Error::InvalidAttribute("Invalid face vertex list".into())
                })?;
            if vtx.len() < 3 {
                return Err(Error::InvalidAttribute(
                    "Face with fewer than 3 vertices".into(),
                ));
            }
            builder.push_polygon(&vtx)?;
        }
    }
    for attr in generic {
        builder.push_generic(attr);
    }
    builder.build()
}

impl<'a> VertexLayout<'a> {
    /// Make vertex layout from the vertex element definition
    fn new(elem: &'a ElementDef) -> Result<Self> {
        let scalars: Vec<&str> = elem
            .properties
            .values()
            .filter(|p| matches!(p.data_type, PropertyType::Scalar(_)))
            .map(|p| p.name.as_str())
            .collect();
        let has = |name: &str| scalars.iter().any(|n| *n == name);
        if !(has("x") && has("y") && has("z")) {
            return Err(Error::InvalidAttribute(
                "Vertex without x, y, z".into(),
            ));
        }
        let mut layout = VertexLayout::default();
        if has("nx") && has("ny") && has("nz") {
            layout.norm = Some(["nx", "ny", "nz"]);
        }
        layout.uv = UV_NAMES
            .iter()
            .find(|(u, v)| has(*u) && has(*v))
            .map(|(u, v)| [*u, *v]);
        layout.color = COLOR_NAMES.into_iter().filter(|n| has(*n)).collect();
        for name in &scalars {
            let used = ["x", "y", "z"].contains(name)
                || layout.norm.is_some_and(|n| n.contains(name))
                || layout.uv.is_some_and(|uv| uv.contains(name))
                || layout.color.contains(name);
            if !used {
                layout.other.push(*name);
            }
        }
        Ok(layout)
    }

    /// Make empty generic attributes
    fn generic_attributes(&self) -> Vec<GenericAttribute> {
        let mut attrs = Vec::new();
        if !self.color.is_empty() {
            attrs.push(GenericAttribute::new(
                "color",
                self.color.len(),
                Vec::new(),
            ));
        }
        for name in &self.other {
            attrs.push(GenericAttribute::new(name, 1, Vec::new()));
        }
        attrs
    }

    /// Push one vertex record
    fn push_vertex(
        &self,
        vtx: &DefaultElement,
        builder: &mut MeshBuilder,
        generic: &mut [GenericAttribute],
    ) -> Result<()> {
        let s = |name: &str| {
            vtx.get(name).and_then(scalar).ok_or_else(|| {
                Error::InvalidAttribute(format!("Vertex property {name}"))
            })
        };
        builder.push_vtx(Vec3::new(s("x")?, s("y")?, s("z")?));
        if let Some([x, y, z]) = self.norm {
            builder.push_norm(Vec3::new(s(x)?, s(y)?, s(z)?));
        }
        if let Some([u, v]) = self.uv {
            builder.push_uv(Vec2::new(s(u)?, s(v)?));
        }
        let mut attrs = generic.iter_mut();
        if !self.color.is_empty() {
            let vals = self
                .color
                .iter()
                .map(|n| s(*n))
                .collect::<Result<Vec<f32>>>()?;
            if let Some(attr) = attrs.next() {
                attr.push(&vals);
            }
        }
        for (name, attr) in self.other.iter().zip(attrs) {
            attr.push(&[s(*name)?]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TRI: &str = "\
ply
format ascii 1.0
comment made by hand
element vertex 4
property float x
property float y
property float z
property float nx
property float ny
property float nz
property uchar red
property uchar green
property uchar blue
property float quality
element face 2
property list uchar int vertex_indices
end_header
0 0 0 0 0 1 255 0 0 0.5
1 0 0 0 0 1 0 255 0 0.25
1 1 0 0 0 1 0 0 255 1
0 1 0 0 0 1 9 9 9 0
3 0 1 2
3 0 2 3
";

    #[test]
    fn tri() {
        let mesh = parse(TRI.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.normals()[1], Vec3::Z);
        assert!(mesh.tex_coords().is_empty());
        let generic = mesh.generic();
        assert_eq!(generic.len(), 2);
        assert_eq!(generic[0].name(), "color");
        assert_eq!(generic[0].components(), 3);
        assert_eq!(&generic[0].values()[3..6], &[0.0, 255.0, 0.0]);
        assert_eq!(generic[1].name(), "quality");
        assert_eq!(generic[1].values(), &[0.5, 0.25, 1.0, 0.0]);
    }

    #[test]
    fn polygon() {
        let src = "ply\nformat ascii 1.0\nelement vertex 4\n\
                   property float x\nproperty float y\nproperty float z\n\
                   property float s\nproperty float t\n\
                   element face 1\nproperty list uchar int vertex_index\n\
                   end_header\n\
                   0 0 0 0 0\n1 0 0 1 0\n1 1 0 1 1\n0 1 0 0 1\n\
                   4 0 1 2 3\n";
        let mesh = parse(src.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.tex_coords()[2], Vec2::new(1.0, 1.0));
        assert!(mesh.generic().is_empty());
    }

    #[test]
    fn binary() {
        let mut data = b"ply\nformat binary_little_endian 1.0\n\
                         element vertex 3\n\
                         property float x\nproperty float y\nproperty float z\n\
                         element face 1\n\
                         property list uchar uint vertex_indices\n\
                         end_header\n"
            .to_vec();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        data.push(3);
        for i in [0u32, 1, 2] {
            data.extend_from_slice(&i.to_le_bytes());
        }
        let mesh = parse(&data[..]).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.positions()[1], Vec3::X);
    }

    #[test]
    fn errors() {
        assert!(matches!(parse("obj\n".as_bytes()), Err(Error::Ply(_))));
        let short = "ply\nformat ascii 1.0\nelement vertex 2\n\
                     property float x\nproperty float y\nproperty float z\n\
                     end_header\n0 0 0\n";
        assert!(parse(short.as_bytes()).is_err());
        let no_z = "ply\nformat ascii 1.0\nelement vertex 1\n\
                    property float x\nproperty float y\n\
                    end_header\n0 0\n";
        assert!(matches!(
            parse(no_z.as_bytes()),
            Err(Error::InvalidAttribute(_))
        ));
    }
}
