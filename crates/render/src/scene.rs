use std::f32::consts::TAU;
use std::path::PathBuf;

use glam::{Mat4, Quat, Vec3};
use phongview_common::Transform;
use serde::{Deserialize, Serialize};

use crate::SceneConfig;

/// Where an object's geometry comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshSource {
    /// OBJ or glTF file.
    File { path: PathBuf },
    Cube {
        #[serde(default = "one")]
        size: f32,
    },
    /// Grid on the XZ plane, optionally displaced by a height map image.
    Terrain {
        #[serde(default = "ten")]
        width: f32,
        #[serde(default = "ten")]
        depth: f32,
        #[serde(default = "fifty")]
        columns: u32,
        #[serde(default = "fifty")]
        rows: u32,
        #[serde(default = "five")]
        max_height: f32,
        #[serde(default)]
        heightmap: Option<PathBuf>,
    },
}

fn one() -> f32 {
    1.0
}
fn five() -> f32 {
    5.0
}
fn ten() -> f32 {
    10.0
}
fn fifty() -> u32 {
    50
}

/// Which pass draws the object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Alpha blended, no depth writes.
    Transparent,
}

/// Base colour multiplied with the texture, plus overall opacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub color: Vec3,
    pub opacity: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
        }
    }
}

/// Continuous rotation around `axis` through the object's position.
///
/// `orbit_offset` is applied after the rotation, so a non-zero offset makes
/// the object circle its position instead of spinning in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spin {
    pub axis: Vec3,
    pub orbit_offset: Vec3,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            axis: Vec3::Y,
            orbit_offset: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshSource,
    pub texture: Option<PathBuf>,
    pub material: MaterialSettings,
    pub blend: BlendMode,
    pub transform: Transform,
    pub spin: Option<Spin>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: "object".into(),
            mesh: MeshSource::Cube { size: 1.0 },
            texture: None,
            material: MaterialSettings::default(),
            blend: BlendMode::Opaque,
            transform: Transform::default(),
            spin: None,
        }
    }
}

impl SceneObject {
    /// World matrix at the given scene angle (radians).
    pub fn model_matrix(&self, angle: f32) -> Mat4 {
        let Some(spin) = self.spin else {
            return self.transform.matrix();
        };
        let axis = spin.axis.try_normalize().unwrap_or(Vec3::Y);
        Mat4::from_translation(self.transform.position)
            * Mat4::from_quat(Quat::from_axis_angle(axis, angle))
            * Mat4::from_translation(spin.orbit_offset)
            * Mat4::from_quat(self.transform.rotation)
            * Mat4::from_scale(self.transform.scale)
    }
}

/// Scene configuration plus the animation clock.
#[derive(Debug, Clone)]
pub struct Scene {
    pub config: SceneConfig,
    angle: f32,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self { config, angle: 0.0 }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.config.objects
    }

    /// Current rotation angle in radians, in `[0, 2π)`.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Advance the animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let angle = (self.angle + self.config.rotation_speed * dt).rem_euclid(TAU);
        // rem_euclid rounds tiny negative angles up to exactly TAU.
        self.angle = if angle < TAU { angle } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn static_object_uses_plain_transform() {
        let object = SceneObject {
            transform: Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            ..SceneObject::default()
        };
        assert_eq!(object.model_matrix(1.0), object.transform.matrix());
    }

    #[test]
    fn orbiting_object_circles_its_position() {
        let object = SceneObject {
            transform: Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
            spin: Some(Spin {
                axis: Vec3::Y,
                orbit_offset: Vec3::new(0.0, 0.0, 2.0),
            }),
            ..SceneObject::default()
        };
        let origin = |angle| object.model_matrix(angle).transform_point3(Vec3::ZERO);
        assert!(approx(origin(0.0), Vec3::new(0.0, 0.0, -3.0)));
        assert!(approx(origin(FRAC_PI_2), Vec3::new(2.0, 0.0, -5.0)));
    }

    #[test]
    fn spinning_in_place_keeps_origin() {
        let object = SceneObject {
            transform: Transform::from_position(Vec3::new(0.0, -1.0, -3.0)),
            spin: Some(Spin {
                axis: Vec3::new(1.0, 1.0, 0.0),
                orbit_offset: Vec3::ZERO,
            }),
            ..SceneObject::default()
        };
        let p = object.model_matrix(2.0).transform_point3(Vec3::ZERO);
        assert!(approx(p, Vec3::new(0.0, -1.0, -3.0)));
    }

    #[test]
    fn update_advances_and_wraps() {
        let mut scene = Scene::new(SceneConfig {
            rotation_speed: 1.0,
            ..SceneConfig::default()
        });
        scene.update(0.5);
        assert!((scene.angle() - 0.5).abs() < 1e-6);
        scene.update(TAU);
        assert!((scene.angle() - 0.5).abs() < 1e-4);
        assert!(scene.angle() < TAU);
    }

    #[test]
    fn reverse_spin_stays_below_full_turn() {
        let mut scene = Scene::new(SceneConfig {
            rotation_speed: -1.0,
            ..SceneConfig::default()
        });
        scene.update(1e-9);
        assert!(scene.angle() >= 0.0 && scene.angle() < TAU);
        scene.update(FRAC_PI_2);
        assert!((scene.angle() - (TAU - FRAC_PI_2)).abs() < 1e-4);
    }

    #[test]
    fn mesh_source_yaml_defaults() {
        let source: MeshSource = serde_yaml::from_str("kind: terrain\ncolumns: 8\n").unwrap();
        assert_eq!(
            source,
            MeshSource::Terrain {
                width: 10.0,
                depth: 10.0,
                columns: 8,
                rows: 50,
                max_height: 5.0,
                heightmap: None,
            }
        );
    }
}
