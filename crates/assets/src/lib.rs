//! CPU-side asset import for the demo scene.
//!
//! Meshes come from Wavefront OBJ (tobj) or glTF (gltf) files, or from the
//! procedural generators. Images are decoded with the `image` crate. Nothing
//! here touches the GPU; the wgpu backend uploads what this crate produces.

mod import;
mod mesh;
mod primitives;
mod texture;

pub use import::load_mesh;
pub use mesh::MeshData;
pub use primitives::{TerrainParams, cube, fullscreen_quad, terrain};
pub use texture::{CUBE_FACE_NAMES, ImageData, load_cube_faces, load_image};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ import error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("glTF import error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),
    #[error("file contains no triangle mesh: {0}")]
    EmptyMesh(String),
    #[error("invalid mesh {name}: {reason}")]
    InvalidMesh { name: String, reason: String },
    #[error("cube face {face} is {width}x{height}, expected {expected}x{expected}")]
    CubeFaceMismatch {
        face: &'static str,
        width: u32,
        height: u32,
        expected: u32,
    },
}

pub fn crate_info() -> &'static str {
    "phongview-assets v0.1.0"
}
