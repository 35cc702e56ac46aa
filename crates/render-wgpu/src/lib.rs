//! wgpu render backend for phongview.
//!
//! Draws a [`phongview_render::Scene`] with Phong lighting and linear fog into
//! an off-screen target, then copies it to the surface through a
//! post-processing effect. The camera is a first-person fly camera.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Pipeline depth/blend state is derived from [`phongview_render::Stage::pass_state`].
//! - Objects whose assets fail to load are skipped; they never abort the frame.

mod camera;
mod gpu;
mod mesh;
mod pipeline;
mod postprocess;
mod shaders;
mod skybox;
mod texture;

pub use camera::FlyCamera;
pub use gpu::{RenderError, SceneRenderer};
pub use mesh::{GpuMesh, Vertex, interleave, mesh_for_source};
pub use postprocess::{OffscreenTarget, PostProcess};
pub use skybox::Skybox;
pub use texture::GpuTexture;
