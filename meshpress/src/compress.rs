// compress.rs  Encode orchestration
//
// Copyright (c) 2024  meshpress contributors
//
use crate::encoder::{DracoEncoder, EncoderConfig, MeshEncoder, MAX_SPEED};
use crate::error::{Error, Result};
use crate::io::{BufferWriter, FileBufferWriter, FileMeshReader, MeshReader};
use crate::mesh::AttributeKind;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Compression options
///
/// Values are not validated here; the encoder rejects anything out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Position quantization bits
    pub pos_quantization_bits: i32,

    /// Texture coordinate quantization bits
    pub tex_coords_quantization_bits: i32,

    /// Normal quantization bits
    pub normals_quantization_bits: i32,

    /// Generic attribute quantization bits
    pub generic_quantization_bits: i32,

    /// Compression level (0-10, higher is smaller / slower)
    pub compression_level: i32,
}

/// Kind of encode result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeResultKind {
    Ok,
    FileReadError,
    MeshEncodeError,
    FileWriteError,
}

/// Result of an encode call
#[derive(Debug)]
pub enum EncodeResult {
    /// Mesh encoded and written
    Ok,

    /// Source mesh could not be read
    FileReadError(Error),

    /// Encoder rejected the mesh or options
    MeshEncodeError(Error),

    /// Destination could not be written
    FileWriteError(Option<Error>),
}

/// Mesh compressor
///
/// Reads a mesh, encodes it and writes the compressed buffer.
///
/// ```rust,no_run
/// # use meshpress::{Compressor, Options};
/// let compressor = Compressor::default();
/// let res = compressor.encode("bunny.obj", "bunny.drc", &Options::default());
/// assert!(res.is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct Compressor<R, E, W> {
    /// Mesh reader
    reader: R,

    /// Mesh encoder
    encoder: E,

    /// Buffer writer
    writer: W,
}

/// Get encoder speed for a compression level
///
/// Levels outside of 0-10 are passed through.
pub fn compression_speed(level: i32) -> i32 {
    MAX_SPEED.saturating_sub(level)
}

impl Default for Options {
    fn default() -> Self {
        Options {
            pos_quantization_bits: 11,
            tex_coords_quantization_bits: 10,
            normals_quantization_bits: 8,
            generic_quantization_bits: 8,
            compression_level: 7,
        }
    }
}

impl Options {
    /// Get encoder speed
    pub fn speed(&self) -> i32 {
        compression_speed(self.compression_level)
    }

    /// Make encoder configuration
    pub fn encoder_config(&self) -> EncoderConfig {
        let mut config = EncoderConfig::default();
        config.set_attribute_quantization(
            AttributeKind::Position,
            self.pos_quantization_bits,
        );
        config.set_attribute_quantization(
            AttributeKind::TexCoord,
            self.tex_coords_quantization_bits,
        );
        config.set_attribute_quantization(
            AttributeKind::Normal,
            self.normals_quantization_bits,
        );
        config.set_attribute_quantization(
            AttributeKind::Generic,
            self.generic_quantization_bits,
        );
        let speed = self.speed();
        config.set_speed_options(speed, speed);
        config
    }
}

impl fmt::Display for EncodeResultKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeResultKind::Ok => write!(f, "Ok"),
            EncodeResultKind::FileReadError => write!(f, "File read error"),
            EncodeResultKind::MeshEncodeError => write!(f, "Mesh encode error"),
            EncodeResultKind::FileWriteError => write!(f, "File write error"),
        }
    }
}

impl fmt::Display for EncodeResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status() {
            Some(err) => write!(f, "{}: {err}", self.kind()),
            None => write!(f, "{}", self.kind()),
        }
    }
}

impl EncodeResult {
    /// Get result kind
    pub fn kind(&self) -> EncodeResultKind {
        match self {
            EncodeResult::Ok => EncodeResultKind::Ok,
            EncodeResult::FileReadError(_) => EncodeResultKind::FileReadError,
            EncodeResult::MeshEncodeError(_) => {
                EncodeResultKind::MeshEncodeError
            }
            EncodeResult::FileWriteError(_) => {
                EncodeResultKind::FileWriteError
            }
        }
    }

    /// Check if result is `Ok`
    pub fn is_ok(&self) -> bool {
        matches!(self, EncodeResult::Ok)
    }

    /// Get diagnostic status
    pub fn status(&self) -> Option<&Error> {
        match self {
            EncodeResult::Ok => None,
            EncodeResult::FileReadError(e) | EncodeResult::MeshEncodeError(e) => {
                Some(e)
            }
            EncodeResult::FileWriteError(e) => e.as_ref(),
        }
    }

    /// Convert into a `Result`
    ///
    /// A write failure without diagnostic becomes an I/O error.
    pub fn into_result(self) -> Result<()> {
        match self {
            EncodeResult::Ok => Ok(()),
            EncodeResult::FileReadError(e)
            | EncodeResult::MeshEncodeError(e)
            | EncodeResult::FileWriteError(Some(e)) => Err(e),
            EncodeResult::FileWriteError(None) => {
                Err(Error::Io(std::io::Error::other("File write error")))
            }
        }
    }
}

impl Default for Compressor<FileMeshReader, DracoEncoder, FileBufferWriter> {
    fn default() -> Self {
        Compressor::new(FileMeshReader, DracoEncoder, FileBufferWriter)
    }
}

impl<R, E, W> Compressor<R, E, W>
where
    R: MeshReader,
    E: MeshEncoder,
    W: BufferWriter,
{
    /// Create a new compressor
    pub fn new(reader: R, encoder: E, writer: W) -> Self {
        Compressor {
            reader,
            encoder,
            writer,
        }
    }

    /// Encode a mesh file
    pub fn encode<P, Q>(&self, input: P, output: Q, options: &Options) -> EncodeResult
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref();
        let output = output.as_ref();
        let mesh = match self.reader.read_mesh(input) {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::warn!("reading {}: {e}", input.display());
                return EncodeResult::FileReadError(e);
            }
        };
        let config = options.encoder_config();
        tracing::debug!("{config:?}");
        let buffer = match self.encoder.encode_mesh(&mesh, &config) {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!("encoding {}: {e}", input.display());
                return EncodeResult::MeshEncodeError(e);
            }
        };
        drop(mesh);
        if let Err(e) = self.writer.write_buffer(output, &buffer) {
            tracing::warn!("writing {}: {e}", output.display());
            return EncodeResult::FileWriteError(Some(e));
        }
        tracing::info!(
            "encoded {} => {} ({} bytes)",
            input.display(),
            output.display(),
            buffer.len()
        );
        EncodeResult::Ok
    }
}

/// Encode a mesh file with the default reader, encoder and writer
pub fn encode<P, Q>(input: P, output: Q, options: &Options) -> EncodeResult
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Compressor::default().encode(input, output, options)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::Mesh;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory mesh reader
    struct MemReader(HashMap<PathBuf, Mesh>);

    /// In-memory buffer writer
    #[derive(Default)]
    struct MemWriter {
        files: RefCell<HashMap<PathBuf, Vec<u8>>>,
        read_only: bool,
    }

    /// Encoder which records configs it is given
    #[derive(Default)]
    struct SpyEncoder(RefCell<Vec<EncoderConfig>>);

    impl MeshReader for MemReader {
        fn read_mesh(&self, path: &Path) -> Result<Mesh> {
            self.0.get(path).cloned().ok_or_else(|| {
                Error::Io(std::io::ErrorKind::NotFound.into())
            })
        }
    }

    impl BufferWriter for MemWriter {
        fn write_buffer(&self, path: &Path, bytes: &[u8]) -> Result<()> {
            if self.read_only {
                return Err(Error::Io(
                    std::io::ErrorKind::PermissionDenied.into(),
                ));
            }
            self.files.borrow_mut().insert(path.into(), bytes.to_vec());
            Ok(())
        }
    }

    impl MeshEncoder for SpyEncoder {
        fn encode_mesh(
            &self,
            mesh: &Mesh,
            config: &EncoderConfig,
        ) -> Result<Vec<u8>> {
            self.0.borrow_mut().push(*config);
            DracoEncoder.encode_mesh(mesh, config)
        }
    }

    fn triangle() -> Mesh {
        let mut builder = Mesh::builder();
        builder.push_vtx(Vec3::ZERO);
        builder.push_vtx(Vec3::X);
        builder.push_vtx(Vec3::Y);
        builder.push_face([0, 1, 2]).unwrap();
        builder.build().unwrap()
    }

    fn reader() -> MemReader {
        let mut meshes = HashMap::new();
        meshes.insert(PathBuf::from("tri.obj"), triangle());
        MemReader(meshes)
    }

    #[test]
    fn speed() {
        assert_eq!(compression_speed(0), 10);
        assert_eq!(compression_speed(7), 3);
        assert_eq!(compression_speed(10), 0);
        assert_eq!(compression_speed(12), -2);
        assert_eq!(compression_speed(-1), 11);
        for level in 0..10 {
            assert!(compression_speed(level) > compression_speed(level + 1));
        }
    }

    #[test]
    fn config() {
        let options = Options {
            pos_quantization_bits: 14,
            tex_coords_quantization_bits: 12,
            normals_quantization_bits: 7,
            generic_quantization_bits: 5,
            compression_level: 10,
        };
        let config = options.encoder_config();
        assert_eq!(config.attribute_quantization(AttributeKind::Position), 14);
        assert_eq!(config.attribute_quantization(AttributeKind::TexCoord), 12);
        assert_eq!(config.attribute_quantization(AttributeKind::Normal), 7);
        assert_eq!(config.attribute_quantization(AttributeKind::Generic), 5);
        assert_eq!(config.encoding_speed(), 0);
        assert_eq!(config.decoding_speed(), 0);
    }

    #[test]
    fn ok() {
        let writer = MemWriter::default();
        let compressor = Compressor::new(reader(), DracoEncoder, &writer);
        let res = compressor.encode("tri.obj", "tri.drc", &Options::default());
        assert!(res.is_ok());
        assert!(res.status().is_none());
        let files = writer.files.borrow();
        assert!(files[Path::new("tri.drc")].starts_with(b"DRACO"));
    }

    #[test]
    fn read_error() {
        let writer = MemWriter::default();
        let spy = SpyEncoder::default();
        let compressor = Compressor::new(reader(), &spy, &writer);
        let res = compressor.encode("none.obj", "none.drc", &Options::default());
        assert_eq!(res.kind(), EncodeResultKind::FileReadError);
        assert!(res.status().is_some());
        assert!(spy.0.borrow().is_empty());
        assert!(writer.files.borrow().is_empty());
    }

    #[test]
    fn encode_error() {
        let writer = MemWriter::default();
        let compressor = Compressor::new(reader(), DracoEncoder, &writer);
        let options = Options {
            pos_quantization_bits: 0,
            ..Default::default()
        };
        let res = compressor.encode("tri.obj", "tri.drc", &options);
        assert_eq!(res.kind(), EncodeResultKind::MeshEncodeError);
        assert!(matches!(
            res.status(),
            Some(Error::InvalidQuantization(AttributeKind::Position, 0))
        ));
        assert!(writer.files.borrow().is_empty());
    }

    #[test]
    fn level_out_of_range() {
        let writer = MemWriter::default();
        let spy = SpyEncoder::default();
        let compressor = Compressor::new(reader(), &spy, &writer);
        let options = Options {
            compression_level: 11,
            ..Default::default()
        };
        let res = compressor.encode("tri.obj", "tri.drc", &options);
        assert_eq!(res.kind(), EncodeResultKind::MeshEncodeError);
        let configs = spy.0.borrow();
        assert_eq!(configs[0].encoding_speed(), -1);
        assert_eq!(configs[0].decoding_speed(), -1);
    }

    #[test]
    fn write_error() {
        let writer = MemWriter {
            read_only: true,
            ..Default::default()
        };
        let compressor = Compressor::new(reader(), DracoEncoder, &writer);
        let res = compressor.encode("tri.obj", "tri.drc", &Options::default());
        assert_eq!(res.kind(), EncodeResultKind::FileWriteError);
        assert!(res.status().is_some());
        assert!(res.into_result().is_err());
    }

    #[test]
    fn deterministic() {
        let writer = MemWriter::default();
        let compressor = Compressor::new(reader(), DracoEncoder, &writer);
        let options = Options::default();
        assert!(compressor.encode("tri.obj", "a.drc", &options).is_ok());
        assert!(compressor.encode("tri.obj", "b.drc", &options).is_ok());
        let files = writer.files.borrow();
        assert_eq!(files[Path::new("a.drc")], files[Path::new("b.drc")]);
    }

    #[test]
    fn options_muon() {
        let options: Options = muon_rs::from_str(
            "pos_quantization_bits: 14\ncompression_level: 10\n",
        )
        .unwrap();
        assert_eq!(options.pos_quantization_bits, 14);
        assert_eq!(options.compression_level, 10);
        assert_eq!(options.normals_quantization_bits, 8);
    }
}
