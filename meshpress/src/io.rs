// io.rs        Mesh reader / buffer writer capabilities
//
// Copyright (c) 2024  meshpress contributors
//
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::{obj, ply, stl};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Capability to read a mesh from a path
pub trait MeshReader {
    /// Read a mesh
    fn read_mesh(&self, path: &Path) -> Result<Mesh>;
}

/// Capability to write a byte buffer to a path
pub trait BufferWriter {
    /// Write all bytes, creating or truncating the destination
    fn write_buffer(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Mesh file reader
///
/// The format is selected by file extension: `.obj`, `.ply` or `.stl`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileMeshReader;

/// Buffer file writer
#[derive(Clone, Copy, Debug, Default)]
pub struct FileBufferWriter;

/// Supported mesh file formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshFormat {
    /// Wavefront OBJ
    Obj,

    /// Stanford PLY (ASCII or binary)
    Ply,

    /// STL (binary or ASCII)
    Stl,
}

impl MeshFormat {
    /// Get format from a path extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "obj" => Some(MeshFormat::Obj),
            "ply" => Some(MeshFormat::Ply),
            "stl" => Some(MeshFormat::Stl),
            _ => None,
        }
    }
}

impl<T: MeshReader + ?Sized> MeshReader for &T {
    fn read_mesh(&self, path: &Path) -> Result<Mesh> {
        (**self).read_mesh(path)
    }
}

impl<T: BufferWriter + ?Sized> BufferWriter for &T {
    fn write_buffer(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        (**self).write_buffer(path, bytes)
    }
}

impl MeshReader for FileMeshReader {
    fn read_mesh(&self, path: &Path) -> Result<Mesh> {
        let format = MeshFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedFormat(path.display().to_string())
        })?;
        match format {
            MeshFormat::Obj => obj::parse(BufReader::new(File::open(path)?)),
            MeshFormat::Ply => ply::parse(BufReader::new(File::open(path)?)),
            MeshFormat::Stl => stl::parse(&std::fs::read(path)?),
        }
    }
}

impl BufferWriter for FileBufferWriter {
    fn write_buffer(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn formats() {
        let fmt = |p: &str| MeshFormat::from_path(&PathBuf::from(p));
        assert_eq!(fmt("bunny.obj"), Some(MeshFormat::Obj));
        assert_eq!(fmt("dir/BUNNY.PLY"), Some(MeshFormat::Ply));
        assert_eq!(fmt("part.Stl"), Some(MeshFormat::Stl));
        assert_eq!(fmt("scene.glb"), None);
        assert_eq!(fmt("noext"), None);
    }

    #[test]
    fn unsupported() {
        let res = FileMeshReader.read_mesh(Path::new("model.fbx"));
        assert!(matches!(res, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn missing() {
        let res = FileMeshReader.read_mesh(Path::new("/nonexistent/a.obj"));
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
