// stl.rs       STL reader (binary or ASCII)
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::{Error, Result};
use crate::mesh::{Mesh, MeshBuilder};
use glam::Vec3;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;

/// Size of binary header
const HEADER_LEN: usize = 80;

/// Size of one binary facet record
const FACET_LEN: usize = 50;

/// Number of leading bytes checked for binary content
const SNIFF_LEN: usize = 512;

/// Mesh builder which splits vertices by facet normal
#[derive(Default)]
struct Welder {
    builder: MeshBuilder,
    vertices: HashMap<(usize, [u32; 3]), usize>,
}

impl Welder {
    /// Push one facet with its normal
    fn push_facet(
        &mut self,
        norm: Vec3,
        vtx: [usize; 3],
        pos: [Vec3; 3],
    ) -> Result<()> {
        let norm = if norm.length_squared() > 0.0 {
            norm.normalize()
        } else {
            (pos[1] - pos[0]).cross(pos[2] - pos[0]).normalize_or_zero()
        };
        let key = [norm.x.to_bits(), norm.y.to_bits(), norm.z.to_bits()];
        let mut tri = [0; 3];
        for ((t, v), p) in tri.iter_mut().zip(vtx).zip(pos) {
            let builder = &mut self.builder;
            *t = *self.vertices.entry((v, key)).or_insert_with(|| {
                let idx = builder.push_vtx(p);
                builder.push_norm(norm);
                idx
            });
        }
        self.builder.push_face(tri)
    }
}

/// Check whether data is a binary STL
///
/// A `solid` header alone is not enough: many exporters write it into
/// binary headers too.
fn is_binary(data: &[u8]) -> bool {
    if !data.starts_with(b"solid") {
        return true;
    }
    if let Some(count) = data.get(HEADER_LEN..HEADER_LEN + 4) {
        let n = u32::from_le_bytes([count[0], count[1], count[2], count[3]]);
        let expected = (n as usize)
            .checked_mul(FACET_LEN)
            .and_then(|len| len.checked_add(HEADER_LEN + 4));
        if expected == Some(data.len()) {
            return true;
        }
    }
    data.iter()
        .take(SNIFF_LEN)
        .any(|b| *b == 0 || !b.is_ascii())
}

/// Adjust data so the STL reader picks the sniffed variant
fn normalize(data: &[u8]) -> Cow<[u8]> {
    if is_binary(data) {
        if data.starts_with(b"solid") {
            let mut data = data.to_vec();
            data[..5].fill(b' ');
            return Cow::Owned(data);
        }
    } else if !data.starts_with(b"solid ") {
        // `solid` with no name
        let mut fixed = b"solid ".to_vec();
        fixed.extend_from_slice(&data[5..]);
        return Cow::Owned(fixed);
    }
    Cow::Borrowed(data)
}

/// Parse an STL mesh
pub fn parse(data: &[u8]) -> Result<Mesh> {
    let data = normalize(data);
    let stl =
        stl_io::read_stl(&mut Cursor::new(&data[..])).map_err(Error::Stl)?;
    let pos: Vec<Vec3> = stl
        .vertices
        .iter()
        .map(|v| Vec3::from_array(v.0))
        .collect();
    let mut welder = Welder::default();
    for face in &stl.faces {
        let vtx = face.vertices;
        let tri = [pos.get(vtx[0]), pos.get(vtx[1]), pos.get(vtx[2])];
        if let [Some(a), Some(b), Some(c)] = tri {
            let norm = Vec3::from_array(face.normal.0);
            welder.push_facet(norm, vtx, [*a, *b, *c])?;
        }
    }
    tracing::trace!("{} facets, {} positions", stl.faces.len(), pos.len());
    welder.builder.build()
}

#[cfg(test)]
mod test {
    use super::*;

    const ASCII: &str = "\
solid square
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 1 0
    endloop
  endfacet
  facet normal 0 0 0
    outer loop
      vertex 0 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid square
";

    fn binary(tris: &[[Vec3; 3]]) -> Vec<u8> {
        // header starting with "solid" to check sniffing
        let mut data = b"solid but actually binary".to_vec();
        data.resize(HEADER_LEN, 0);
        data.extend_from_slice(&(tris.len() as u32).to_le_bytes());
        for tri in tris {
            for v in [Vec3::ZERO, tri[0], tri[1], tri[2]] {
                for c in v.to_array() {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0, 0]);
        }
        data
    }

    #[test]
    fn ascii() {
        let mesh = parse(ASCII.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.normals().iter().all(|n| *n == Vec3::Z));
    }

    #[test]
    fn ascii_unnamed() {
        let src = ASCII.replacen("solid square", "solid", 1);
        let mesh = parse(src.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn binary_welded() {
        let tris = [
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        ];
        let mesh = parse(&binary(&tris)).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn split_by_normal() {
        let tris = [
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec3::ZERO, Vec3::Y, Vec3::Z],
        ];
        let mesh = parse(&binary(&tris)).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.normals()[0], Vec3::Z);
        assert_eq!(mesh.normals()[3], Vec3::X);
    }

    #[test]
    fn binary_solid_trailing_bytes() {
        let tris = [[Vec3::ZERO, Vec3::X, Vec3::Y]];
        let mut data = binary(&tris);
        data.push(0);
        let mesh = parse(&data).unwrap();
        assert_eq!(mesh.face_count(), 1);
        let mut data = binary(&tris);
        data.extend_from_slice(b"\n\n");
        assert!(is_binary(&data));
        assert_eq!(parse(&data).unwrap().face_count(), 1);
    }

    #[test]
    fn truncated() {
        let tris = [[Vec3::ZERO, Vec3::X, Vec3::Y]];
        let mut data = binary(&tris);
        data[0] = b'x';
        data.truncate(data.len() - 10);
        assert!(matches!(parse(&data), Err(Error::Stl(_))));
    }

    #[test]
    fn bad_vertex() {
        let src = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 nope 0\n";
        assert!(parse(src.as_bytes()).is_err());
    }
}
