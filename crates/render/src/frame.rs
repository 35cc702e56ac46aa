use glam::{Mat4, Vec3};

use crate::scene::{BlendMode, Scene};
use crate::shading::{PostEffect, view_depth};

/// One step of the frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sky,
    Opaque,
    Transparent,
    PostProcess,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Sky => "sky",
            Stage::Opaque => "opaque",
            Stage::Transparent => "transparent",
            Stage::PostProcess => "post_process",
        }
    }

    /// Fixed-function state the stage needs from the backend.
    pub fn pass_state(self) -> PassState {
        match self {
            Stage::Sky => PassState {
                depth_test: true,
                depth_write: false,
                depth_compare: DepthCompare::LessEqual,
                alpha_blend: false,
                cull_back_faces: false,
            },
            Stage::Opaque => PassState {
                depth_test: true,
                depth_write: true,
                depth_compare: DepthCompare::Less,
                alpha_blend: false,
                cull_back_faces: true,
            },
            Stage::Transparent => PassState {
                depth_test: true,
                depth_write: false,
                depth_compare: DepthCompare::Less,
                alpha_blend: true,
                cull_back_faces: true,
            },
            Stage::PostProcess => PassState {
                depth_test: false,
                depth_write: false,
                depth_compare: DepthCompare::Less,
                alpha_blend: false,
                cull_back_faces: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    Less,
    /// Lets the sky pass at the far plane (depth == 1.0).
    LessEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: DepthCompare,
    /// Source-alpha / one-minus-source-alpha blending.
    pub alpha_blend: bool,
    pub cull_back_faces: bool,
}

/// Per-object matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub object_index: usize,
    pub model: Mat4,
    pub model_view: Mat4,
    /// Inverse transpose of `model_view`, for transforming normals.
    pub normal_matrix: Mat4,
    /// Eye-space distance of the object's origin along the view direction.
    pub depth: f32,
}

/// Ordered list of everything drawn in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub stages: Vec<Stage>,
    pub opaque: Vec<DrawItem>,
    pub transparent: Vec<DrawItem>,
    pub effect: PostEffect,
}

impl FramePlan {
    pub fn build(scene: &Scene, view: Mat4, sky_available: bool) -> Self {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();

        for (object_index, object) in scene.objects().iter().enumerate() {
            let model = object.model_matrix(scene.angle());
            let model_view = view * model;
            let item = DrawItem {
                object_index,
                model,
                model_view,
                normal_matrix: model_view.inverse().transpose(),
                depth: view_depth(model_view.transform_point3(Vec3::ZERO)),
            };
            match object.blend {
                BlendMode::Opaque => opaque.push(item),
                BlendMode::Transparent => transparent.push(item),
            }
        }

        // Stable sorts: equal depths keep configuration order.
        opaque.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let mut stages = Vec::with_capacity(4);
        if sky_available {
            stages.push(Stage::Sky);
        }
        stages.extend([Stage::Opaque, Stage::Transparent, Stage::PostProcess]);

        Self {
            stages,
            opaque,
            transparent,
            effect: scene.config.post.effect,
        }
    }

    /// Draws belonging to a stage. Sky and post-process have none.
    pub fn draws(&self, stage: Stage) -> &[DrawItem] {
        match stage {
            Stage::Opaque => &self.opaque,
            Stage::Transparent => &self.transparent,
            Stage::Sky | Stage::PostProcess => &[],
        }
    }

    /// Drop draws for objects the backend could not load.
    pub fn retain_objects(&mut self, mut keep: impl FnMut(usize) -> bool) {
        self.opaque.retain(|d| keep(d.object_index));
        self.transparent.retain(|d| keep(d.object_index));
    }

    pub fn draw_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SceneConfig, SceneObject};
    use phongview_common::Transform;

    fn object_at(name: &str, z: f32, blend: BlendMode) -> SceneObject {
        SceneObject {
            name: name.into(),
            blend,
            transform: Transform::from_position(Vec3::new(0.0, 0.0, z)),
            ..SceneObject::default()
        }
    }

    fn scene(objects: Vec<SceneObject>) -> Scene {
        Scene::new(SceneConfig {
            objects,
            ..SceneConfig::default()
        })
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let s = scene(Vec::new());
        let plan = FramePlan::build(&s, Mat4::IDENTITY, true);
        assert_eq!(
            plan.stages,
            vec![Stage::Sky, Stage::Opaque, Stage::Transparent, Stage::PostProcess]
        );
        let plan = FramePlan::build(&s, Mat4::IDENTITY, false);
        assert_eq!(plan.stages.first(), Some(&Stage::Opaque));
        assert_eq!(plan.stages.last(), Some(&Stage::PostProcess));
    }

    #[test]
    fn transparent_draws_back_to_front() {
        let s = scene(vec![
            object_at("near", -2.0, BlendMode::Transparent),
            object_at("far", -9.0, BlendMode::Transparent),
            object_at("mid", -5.0, BlendMode::Transparent),
        ]);
        let plan = FramePlan::build(&s, Mat4::IDENTITY, false);
        let order: Vec<usize> = plan.transparent.iter().map(|d| d.object_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(plan.opaque.is_empty());
    }

    #[test]
    fn opaque_draws_front_to_back() {
        let s = scene(vec![
            object_at("far", -9.0, BlendMode::Opaque),
            object_at("near", -2.0, BlendMode::Opaque),
        ]);
        let plan = FramePlan::build(&s, Mat4::IDENTITY, false);
        let order: Vec<usize> = plan.opaque.iter().map(|d| d.object_index).collect();
        assert_eq!(order, vec![1, 0]);
        assert!((plan.opaque[0].depth - 2.0).abs() < 1e-6);
    }

    #[test]
    fn equal_depths_keep_config_order() {
        let s = scene(vec![
            object_at("a", -4.0, BlendMode::Transparent),
            object_at("b", -4.0, BlendMode::Transparent),
        ]);
        let plan = FramePlan::build(&s, Mat4::IDENTITY, false);
        let order: Vec<usize> = plan.transparent.iter().map(|d| d.object_index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn depth_follows_the_view() {
        let s = scene(vec![
            object_at("a", -2.0, BlendMode::Transparent),
            object_at("b", -9.0, BlendMode::Transparent),
        ]);
        // Camera behind the objects, looking toward +Z.
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, -20.0), Vec3::ZERO, Vec3::Y);
        let plan = FramePlan::build(&s, view, false);
        let order: Vec<usize> = plan.transparent.iter().map(|d| d.object_index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn normal_matrix_is_inverse_transpose() {
        let mut object = object_at("scaled", -3.0, BlendMode::Opaque);
        object.transform.scale = Vec3::new(2.0, 1.0, 1.0);
        let s = scene(vec![object]);
        let plan = FramePlan::build(&s, Mat4::IDENTITY, false);
        let item = plan.opaque[0];
        assert_eq!(item.normal_matrix, item.model_view.inverse().transpose());
    }

    #[test]
    fn retain_drops_unloaded_objects() {
        let s = scene(vec![
            object_at("a", -2.0, BlendMode::Opaque),
            object_at("b", -3.0, BlendMode::Transparent),
        ]);
        let mut plan = FramePlan::build(&s, Mat4::IDENTITY, false);
        assert_eq!(plan.draw_count(), 2);
        plan.retain_objects(|i| i != 1);
        assert_eq!(plan.draw_count(), 1);
        assert!(plan.draws(Stage::Transparent).is_empty());
        assert!(plan.draws(Stage::PostProcess).is_empty());
    }

    #[test]
    fn pass_states_match_blending_rules() {
        let opaque = Stage::Opaque.pass_state();
        assert!(opaque.depth_write && !opaque.alpha_blend);
        let transparent = Stage::Transparent.pass_state();
        assert!(transparent.depth_test && !transparent.depth_write && transparent.alpha_blend);
        let sky = Stage::Sky.pass_state();
        assert_eq!(sky.depth_compare, DepthCompare::LessEqual);
        assert!(!sky.depth_write);
        assert!(!Stage::PostProcess.pass_state().depth_test);
    }
}
