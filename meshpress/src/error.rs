// error.rs     Error definitions
//
// Copyright (c) 2024  meshpress contributors
//
use crate::mesh::AttributeKind;

/// Meshpress errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O {0}")]
    Io(#[from] std::io::Error),

    /// Wavefront OBJ load error
    #[error("OBJ {0}")]
    Obj(#[from] tobj::LoadError),

    /// PLY read error
    #[error("PLY {0}")]
    Ply(std::io::Error),

    /// STL read error
    #[error("STL {0}")]
    Stl(std::io::Error),

    /// Unsupported mesh file format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Mesh without positions or faces
    #[error("Empty mesh")]
    EmptyMesh,

    /// Invalid vertex attribute
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Quantization bits out of range for an attribute
    #[error("Invalid {0} quantization bits: {1}")]
    InvalidQuantization(AttributeKind, i32),

    /// Encoding / decoding speed out of range
    #[error("Invalid speed: {0}")]
    InvalidSpeed(i32),

    /// Draco encoder or decoder failure
    #[error("Draco {0}")]
    Draco(String),

    /// Decoded mesh cannot be represented
    #[error("Decode: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Make a Draco error from a status
    pub(crate) fn draco(status: impl std::fmt::Debug) -> Self {
        Error::Draco(format!("{status:?}"))
    }

    /// Make a decode error
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }
}
