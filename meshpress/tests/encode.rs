// encode tests
use meshpress::{
    decode_file, encode, gltf, EncodeResultKind, Error, Options,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CUBE_OBJ: &str = "\
# unit cube
v -0.5 -0.5 0.5
v -0.5 0.5 0.5
v 0.5 -0.5 0.5
v 0.5 0.5 0.5
v -0.5 -0.5 -0.5
v -0.5 0.5 -0.5
v 0.5 -0.5 -0.5
v 0.5 0.5 -0.5
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 3/2 4/3 2/4
f 3/1 7/2 8/3 4/4
f 7/1 5/2 6/3 8/4
f 5/1 1/2 2/3 6/4
f 2/1 4/2 8/3 6/4
f 5/1 7/2 3/3 1/4
";

const TRI_PLY: &str = "\
ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
property float confidence
element face 1
property list uchar int vertex_indices
end_header
0 0 0 0.1
2 0 0 0.2
0 2 0 0.3
3 0 1 2
";

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn encode_ok() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "cube.obj", CUBE_OBJ);
    let output = dir.path().join("cube.drc");
    let res = encode(&input, &output, &Options::default());
    assert_eq!(res.kind(), EncodeResultKind::Ok, "{res}");
    assert!(fs::read(&output).unwrap().starts_with(b"DRACO"));
    let mesh = decode_file(&output).unwrap();
    assert_eq!(mesh.face_count(), 12);
    assert_eq!(mesh.tex_coords().len(), mesh.vertex_count());
}

#[test]
fn encode_ply() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "tri.ply", TRI_PLY);
    let output = dir.path().join("tri.drc");
    let res = encode(&input, &output, &Options::default());
    assert!(res.is_ok(), "{res}");
    let mesh = decode_file(&output).unwrap();
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.generic().len(), 1);
    assert_eq!(mesh.generic()[0].components(), 1);
}

#[test]
fn encode_stl() {
    let dir = TempDir::new().unwrap();
    let mut data = b"solid exported as binary".to_vec();
    data.resize(80, 0);
    data.extend_from_slice(&1u32.to_le_bytes());
    for v in [[0.0f32, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    {
        for c in v {
            data.extend_from_slice(&c.to_le_bytes());
        }
    }
    data.extend_from_slice(&[0, 0, 0]);
    let input = dir.path().join("tri.stl");
    fs::write(&input, &data).unwrap();
    let output = dir.path().join("tri.drc");
    let res = encode(&input, &output, &Options::default());
    assert!(res.is_ok(), "{res}");
    let mesh = decode_file(&output).unwrap();
    assert_eq!(mesh.face_count(), 1);
    assert_eq!(mesh.normals().len(), 3);
}

#[test]
fn missing_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("missing.obj");
    let output = dir.path().join("missing.drc");
    let res = encode(&input, &output, &Options::default());
    assert_eq!(res.kind(), EncodeResultKind::FileReadError);
    assert!(matches!(res.status(), Some(Error::Io(_))));
    assert!(!output.exists());
}

#[test]
fn existing_output_untouched() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "bad.obj", "v 0 0 0\nf 1 2 3\n");
    let output = write(&dir, "keep.drc", "previous");
    let res = encode(&input, &output, &Options::default());
    assert_eq!(res.kind(), EncodeResultKind::FileReadError);
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
}

#[test]
fn invalid_options() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "cube.obj", CUBE_OBJ);
    let output = dir.path().join("cube.drc");
    let options = Options {
        tex_coords_quantization_bits: 31,
        ..Default::default()
    };
    let res = encode(&input, &output, &options);
    assert_eq!(res.kind(), EncodeResultKind::MeshEncodeError);
    assert!(!output.exists());
}

#[test]
fn unwritable_output() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "cube.obj", CUBE_OBJ);
    let output = dir.path().join("no").join("such").join("cube.drc");
    let res = encode(&input, &output, &Options::default());
    assert_eq!(res.kind(), EncodeResultKind::FileWriteError);
}

#[test]
fn deterministic() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "cube.obj", CUBE_OBJ);
    for level in [0, 5, 10] {
        let options = Options {
            compression_level: level,
            ..Default::default()
        };
        let a = dir.path().join("a.drc");
        let b = dir.path().join("b.drc");
        assert!(encode(&input, &a, &options).is_ok());
        assert!(encode(&input, &b, &options).is_ok());
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }
}

#[test]
fn overwrite() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "cube.obj", CUBE_OBJ);
    let output = write(&dir, "cube.drc", &"x".repeat(10_000));
    assert!(encode(&input, &output, &Options::default()).is_ok());
    assert!(fs::metadata(&output).unwrap().len() < 10_000);
    assert!(decode_file(&output).is_ok());
}

#[test]
fn decode_to_glb() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "cube.obj", CUBE_OBJ);
    let output = dir.path().join("cube.drc");
    assert!(encode(&input, &output, &Options::default()).is_ok());
    let mesh = decode_file(&output).unwrap();
    let glb = dir.path().join("cube.glb");
    gltf::export(fs::File::create(&glb).unwrap(), &mesh).unwrap();
    let data = fs::read(Path::new(&glb)).unwrap();
    assert_eq!(&data[0..4], b"glTF");
}
