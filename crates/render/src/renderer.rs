use std::fmt::Write as _;

use glam::{Mat4, Vec3};

use crate::frame::FramePlan;
use crate::scene::{MeshSource, Scene};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::NEG_Z,
            fov_degrees: 60.0,
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a view, then produces output. It never
/// mutates the scene; animation is advanced by the owner through
/// [`Scene::update`].
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Prints the frame plan instead of drawing it.
///
/// Used by the CLI and tests to inspect pass ordering without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Whether a sky box is assumed to be loaded.
    pub sky_available: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sky(sky_available: bool) -> Self {
        Self { sky_available }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let plan = FramePlan::build(scene, view.view_matrix(), self.sky_available);
        let mut out = String::new();

        let _ = writeln!(
            out,
            "=== Frame (angle={:.3} rad, effect={}) ===",
            scene.angle(),
            plan.effect.name()
        );
        let _ = writeln!(out, "Objects: {}", scene.objects().len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        );

        for stage in &plan.stages {
            let _ = writeln!(out, "[{}]", stage.name());
            for draw in plan.draws(*stage) {
                let object = &scene.objects()[draw.object_index];
                let p = draw.model.transform_point3(Vec3::ZERO);
                let _ = writeln!(
                    out,
                    "  {} ({}) depth={:.2} pos=({:.2}, {:.2}, {:.2})",
                    object.name,
                    mesh_label(&object.mesh),
                    draw.depth,
                    p.x,
                    p.y,
                    p.z
                );
            }
        }

        out
    }
}

fn mesh_label(mesh: &MeshSource) -> String {
    match mesh {
        MeshSource::File { path } => path.display().to_string(),
        MeshSource::Cube { size } => format!("cube {size}"),
        MeshSource::Terrain { columns, rows, .. } => format!("terrain {columns}x{rows}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlendMode, SceneConfig, SceneObject};
    use phongview_common::Transform;

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new(SceneConfig {
            objects: Vec::new(),
            ..SceneConfig::default()
        });
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());

        assert!(output.contains("Objects: 0"));
        assert!(output.contains("effect=passthrough"));
        assert!(!output.contains("[sky]"));
        assert!(output.contains("[post_process]"));
    }

    #[test]
    fn debug_renderer_lists_passes_in_order() {
        let scene = Scene::new(SceneConfig {
            objects: vec![
                SceneObject {
                    name: "glass".into(),
                    blend: BlendMode::Transparent,
                    transform: Transform::from_position(Vec3::new(0.0, 0.0, -4.0)),
                    ..SceneObject::default()
                },
                SceneObject {
                    name: "rock".into(),
                    transform: Transform::from_position(Vec3::new(0.0, 0.0, -8.0)),
                    ..SceneObject::default()
                },
            ],
            ..SceneConfig::default()
        });
        let output = DebugTextRenderer::with_sky(true).render(&scene, &RenderView::default());

        let sky = output.find("[sky]").unwrap();
        let opaque = output.find("[opaque]").unwrap();
        let rock = output.find("rock (cube 1)").unwrap();
        let transparent = output.find("[transparent]").unwrap();
        let glass = output.find("glass").unwrap();
        let post = output.find("[post_process]").unwrap();
        assert!(sky < opaque && opaque < rock && rock < transparent);
        assert!(transparent < glass && glass < post);
        assert!(output.contains("depth=8.00"));
    }

    #[test]
    fn render_view_default_looks_down_negative_z() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        let p = view.view_matrix().transform_point3(Vec3::new(0.0, 0.0, -3.0));
        assert!((p - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-6);
    }
}
