// main.rs      mpress program
//
// Copyright (c) 2024  meshpress contributors
//
mod mesh;
mod view;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use meshpress::{decode, gltf, AttributeKind, Options};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Mesh compression tool
#[derive(FromArgs, PartialEq, Debug)]
struct Args {
    #[argh(subcommand)]
    cmd: Command,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum Command {
    Encode(EncodeCmd),
    Decode(DecodeCmd),
    Info(InfoCmd),
}

/// Compress a mesh file (.obj, .ply, .stl)
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "encode")]
struct EncodeCmd {
    /// options file (muon)
    #[argh(option)]
    config: Option<PathBuf>,

    /// position quantization bits
    #[argh(option, short = 'p')]
    pos_bits: Option<i32>,

    /// texture coordinate quantization bits
    #[argh(option, short = 't')]
    tex_bits: Option<i32>,

    /// normal quantization bits
    #[argh(option, short = 'n')]
    normal_bits: Option<i32>,

    /// generic attribute quantization bits
    #[argh(option, short = 'g')]
    generic_bits: Option<i32>,

    /// compression level (0-10)
    #[argh(option, short = 'c')]
    level: Option<i32>,

    /// view decoded mesh
    #[argh(switch, short = 'v')]
    view: bool,

    /// input mesh file
    #[argh(positional)]
    input: PathBuf,

    /// output file (defaults to input with .drc extension)
    #[argh(positional)]
    output: Option<PathBuf>,
}

/// Decode a Draco mesh to glTF binary (.glb)
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "decode")]
struct DecodeCmd {
    /// compressed mesh file
    #[argh(positional)]
    input: PathBuf,

    /// output file (defaults to input with .glb extension)
    #[argh(positional)]
    output: Option<PathBuf>,
}

/// Print information about a Draco mesh
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "info")]
struct InfoCmd {
    /// compressed mesh file
    #[argh(positional)]
    input: PathBuf,
}

/// Main function
fn main() -> Result<()> {
    init_tracing();
    let args: Args = argh::from_env();
    match args.cmd {
        Command::Encode(cmd) => cmd.run(),
        Command::Decode(cmd) => cmd.run(),
        Command::Info(cmd) => cmd.run(),
    }
}

/// Initialize tracing subscriber (filtered by `RUST_LOG`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Get size of a file
fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map_or(0, |m| m.len())
}

impl EncodeCmd {
    /// Build options from config file and flags
    fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("{} not found", path.display()))?;
                muon_rs::from_reader(file).context("Invalid options")?
            }
            None => Options::default(),
        };
        if let Some(bits) = self.pos_bits {
            options.pos_quantization_bits = bits;
        }
        if let Some(bits) = self.tex_bits {
            options.tex_coords_quantization_bits = bits;
        }
        if let Some(bits) = self.normal_bits {
            options.normals_quantization_bits = bits;
        }
        if let Some(bits) = self.generic_bits {
            options.generic_quantization_bits = bits;
        }
        if let Some(level) = self.level {
            options.compression_level = level;
        }
        Ok(options)
    }

    /// Get output path
    fn output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("drc"))
    }

    /// Run encode command
    fn run(self) -> Result<()> {
        let options = self.options()?;
        let output = self.output();
        if self.view {
            view::view_encode(self.input, output, options);
            return Ok(());
        }
        let res = meshpress::encode(&self.input, &output, &options);
        if !res.is_ok() {
            bail!("{}: {res}", self.input.display());
        }
        println!(
            "{} ({} bytes) => {} ({} bytes)",
            self.input.display(),
            file_len(&self.input),
            output.display(),
            file_len(&output),
        );
        Ok(())
    }
}

impl DecodeCmd {
    /// Run decode command
    fn run(self) -> Result<()> {
        let mesh = meshpress::decode_file(&self.input)
            .with_context(|| format!("Decoding {}", self.input.display()))?;
        let out = self
            .output
            .unwrap_or_else(|| self.input.with_extension("glb"));
        let writer = File::create(&out)
            .with_context(|| format!("Cannot create {}", out.display()))?;
        gltf::export(writer, &mesh).context("Writing glTF")?;
        println!(
            "{} => {} ({} vertices, {} faces)",
            self.input.display(),
            out.display(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(())
    }
}

impl InfoCmd {
    /// Run info command
    fn run(self) -> Result<()> {
        let data = std::fs::read(&self.input)
            .with_context(|| format!("{} not found", self.input.display()))?;
        let mesh = decode(&data).context("Invalid mesh")?;
        println!("file: {} ({} bytes)", self.input.display(), data.len());
        println!("vertices: {}", mesh.vertex_count());
        println!("faces: {}", mesh.face_count());
        for kind in AttributeKind::ALL {
            if kind != AttributeKind::Generic && mesh.has_attribute(kind) {
                println!("attribute: {kind}");
            }
        }
        for attr in mesh.generic() {
            println!(
                "attribute: generic {} ({} components)",
                attr.name(),
                attr.components()
            );
        }
        println!("bounds: {} .. {}", mesh.pos_min(), mesh.pos_max());
        Ok(())
    }
}
