// lib.rs      meshpress crate.
//
// Copyright (c) 2024  meshpress contributors
//
//! Draco 3D mesh compression.
//!
//! Meshes are read from OBJ, PLY or STL files, quantized and encoded into a
//! Draco bitstream.
mod compress;
mod decoder;
mod encoder;
mod error;
pub mod gltf;
mod io;
mod mesh;
mod obj;
mod ply;
mod stl;

pub use compress::{
    compression_speed, encode, Compressor, EncodeResult, EncodeResultKind,
    Options,
};
pub use decoder::{decode, decode_file};
pub use encoder::{
    DracoEncoder, EncoderConfig, MeshEncoder, MAX_SPEED, QUANTIZATION_BITS,
};
pub use error::{Error, Result};
pub use io::{
    BufferWriter, FileBufferWriter, FileMeshReader, MeshFormat, MeshReader,
};
pub use mesh::{AttributeKind, GenericAttribute, Mesh, MeshBuilder};
