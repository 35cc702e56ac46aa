//! Renderer-agnostic scene description and frame planning.
//!
//! # Invariants
//! - Passes run in a fixed order: sky, opaque, transparent, post-process.
//! - Transparent draws are sorted back to front; opaque draws front to back.
//! - Renderers read the scene and a view; they never mutate the scene.

mod config;
mod frame;
mod renderer;
mod scene;
pub mod shading;

pub use config::{
    CameraSettings, ConfigError, FogSettings, LightSettings, PostSettings, SceneConfig,
    SkyboxSettings, WindowSettings,
};
pub use frame::{DepthCompare, DrawItem, FramePlan, PassState, Stage};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use scene::{BlendMode, MaterialSettings, MeshSource, Scene, SceneObject, Spin};
pub use shading::PostEffect;

pub fn crate_info() -> &'static str {
    "phongview-render v0.1.0"
}
