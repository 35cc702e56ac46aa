use std::path::{Path, PathBuf};

use glam::Vec3;
use phongview_common::Transform;
use serde::{Deserialize, Serialize};

use crate::renderer::RenderView;
use crate::scene::{BlendMode, MaterialSettings, MeshSource, SceneObject, Spin};
use crate::shading::PostEffect;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "phongview".into(),
            width: 1024,
            height: 576,
        }
    }
}

/// Initial camera state. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw_degrees: -90.0,
            pitch_degrees: 0.0,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            speed: 5.0,
            sensitivity_degrees: 0.1,
        }
    }
}

impl CameraSettings {
    /// The view this camera starts with.
    pub fn render_view(&self) -> RenderView {
        let (yaw, pitch) = (self.yaw_degrees.to_radians(), self.pitch_degrees.to_radians());
        let forward = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        RenderView {
            eye: self.position,
            target: self.position + forward,
            fov_degrees: self.fov_degrees,
        }
    }
}

/// Single point light plus the Phong terms shared by every material.
///
/// `position` is in eye space: the light follows the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub position: Vec3,
    pub color: Vec3,
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
    pub specular_intensity: f32,
    pub shininess: f32,
    pub specular_color: Vec3,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(10.0, 10.0, 10.0),
            color: Vec3::ONE,
            ambient_intensity: 0.2,
            diffuse_intensity: 0.8,
            specular_intensity: 1.0,
            shininess: 32.0,
            specular_color: Vec3::ONE,
        }
    }
}

/// Linear distance fog in eye space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    /// Distance where fog starts.
    pub near: f32,
    /// Distance where fog is total and fragments are discarded.
    pub far: f32,
    pub color: Vec3,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 50.0,
            color: Vec3::new(0.8, 0.8, 0.9),
        }
    }
}

/// Cube map images at `<prefix><face>.<extension>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyboxSettings {
    pub prefix: String,
    #[serde(default = "default_sky_extension")]
    pub extension: String,
}

fn default_sky_extension() -> String {
    "png".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSettings {
    pub effect: PostEffect,
}

/// Everything needed to build the demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub light: LightSettings,
    pub fog: FogSettings,
    pub clear_color: Vec3,
    pub skybox: Option<SkyboxSettings>,
    pub post: PostSettings,
    /// Radians per second for every spinning object.
    pub rotation_speed: f32,
    pub objects: Vec<SceneObject>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let stone = PathBuf::from("assets/Stone_Base_Color.png");
        Self {
            window: WindowSettings::default(),
            camera: CameraSettings::default(),
            light: LightSettings::default(),
            fog: FogSettings::default(),
            clear_color: Vec3::splat(0.8),
            skybox: None,
            post: PostSettings::default(),
            rotation_speed: 0.6,
            objects: vec![
                SceneObject {
                    name: "ground".into(),
                    mesh: MeshSource::Terrain {
                        width: 10.0,
                        depth: 10.0,
                        columns: 50,
                        rows: 50,
                        max_height: 5.0,
                        heightmap: None,
                    },
                    texture: Some(stone.clone()),
                    transform: Transform::from_position(Vec3::new(0.0, -3.0, -8.0)),
                    ..SceneObject::default()
                },
                SceneObject {
                    name: "model".into(),
                    mesh: MeshSource::File {
                        path: PathBuf::from("assets/model.obj"),
                    },
                    texture: Some(stone),
                    transform: Transform::from_position(Vec3::new(0.0, -1.0, -3.0)),
                    spin: Some(Spin {
                        axis: Vec3::new(1.0, 1.0, 0.0),
                        orbit_offset: Vec3::ZERO,
                    }),
                    ..SceneObject::default()
                },
                SceneObject {
                    name: "glass_cube".into(),
                    mesh: MeshSource::Cube { size: 1.0 },
                    material: MaterialSettings {
                        color: Vec3::new(0.6, 0.8, 1.0),
                        opacity: 0.5,
                    },
                    blend: BlendMode::Transparent,
                    transform: Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
                    spin: Some(Spin {
                        axis: Vec3::Y,
                        orbit_offset: Vec3::new(0.0, 0.0, 2.0),
                    }),
                    ..SceneObject::default()
                },
            ],
        }
    }
}

impl SceneConfig {
    /// Load a YAML (`.yaml`/`.yml`) or JSON (`.json`) config and validate it.
    ///
    /// Relative asset paths are resolved against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut config: Self = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&data)?,
            "json" => serde_json::from_str(&data)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        tracing::info!(
            "loaded scene config {} ({} objects)",
            path.display(),
            config.objects.len()
        );
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Prefix every relative asset path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for object in &mut self.objects {
            match &mut object.mesh {
                MeshSource::File { path } => resolve(path),
                MeshSource::Terrain {
                    heightmap: Some(path),
                    ..
                } => resolve(path),
                _ => {}
            }
            if let Some(texture) = &mut object.texture {
                resolve(texture);
            }
        }
        if let Some(sky) = &mut self.skybox {
            if Path::new(&sky.prefix).is_relative() {
                sky.prefix = base.join(&sky.prefix).display().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.window.width == 0 || self.window.height == 0 {
            return invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            ));
        }
        if !self.rotation_speed.is_finite() {
            return invalid(format!(
                "rotation speed {} must be finite",
                self.rotation_speed
            ));
        }
        let cam = &self.camera;
        if cam.near <= 0.0 || cam.far <= cam.near {
            return invalid(format!(
                "camera clip range {}..{} must satisfy 0 < near < far",
                cam.near, cam.far
            ));
        }
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return invalid(format!(
                "camera fov {} must be between 0 and 180 degrees",
                cam.fov_degrees
            ));
        }
        if self.fog.far <= self.fog.near {
            return invalid(format!(
                "fog range {}..{} must satisfy near < far",
                self.fog.near, self.fog.far
            ));
        }
        if self.light.shininess < 0.0 {
            return invalid(format!(
                "shininess {} must not be negative",
                self.light.shininess
            ));
        }
        for object in &self.objects {
            if !(0.0..=1.0).contains(&object.material.opacity) {
                return invalid(format!(
                    "object {}: opacity {} outside 0..1",
                    object.name, object.material.opacity
                ));
            }
            if let MeshSource::Terrain { columns, rows, .. } = object.mesh {
                if columns == 0 || rows == 0 {
                    return invalid(format!(
                        "object {}: terrain needs at least one column and row",
                        object.name
                    ));
                }
            }
            if let Some(spin) = object.spin {
                if spin.axis.length_squared() == 0.0 {
                    return invalid(format!("object {}: spin axis is zero", object.name));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let view = CameraSettings::default().render_view();
        assert_eq!(view.eye, Vec3::ZERO);
        assert!((view.target - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn default_config_is_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.objects.len(), 3);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.fog.far, 50.0);
    }

    #[test]
    fn yaml_round_trips_through_defaults() {
        let config = SceneConfig::default();
        let yaml = config.to_yaml().unwrap();
        let parsed: SceneConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: SceneConfig = serde_yaml::from_str(
            "fog:\n  far: 20.0\npost:\n  effect: sepia\nobjects: []\n",
        )
        .unwrap();
        assert_eq!(config.fog.far, 20.0);
        assert_eq!(config.fog.near, 1.0);
        assert_eq!(config.post.effect, PostEffect::Sepia);
        assert!(config.objects.is_empty());
        assert_eq!(config.light.shininess, 32.0);
    }

    #[test]
    fn inverted_fog_range_is_rejected() {
        let mut config = SceneConfig::default();
        config.fog.near = 10.0;
        config.fog.far = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_finite_rotation_speed_is_rejected() {
        let mut config = SceneConfig::default();
        config.rotation_speed = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.rotation_speed = -0.6;
        config.validate().unwrap();
    }

    #[test]
    fn bad_camera_clip_is_rejected() {
        let mut config = SceneConfig::default();
        config.camera.near = 0.0;
        assert!(config.validate().is_err());
        config.camera.near = 10.0;
        config.camera.far = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn opacity_out_of_range_is_rejected() {
        let mut config = SceneConfig::default();
        config.objects[2].material.opacity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_yaml_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "objects:\n  - name: rock\n    mesh:\n      kind: file\n      path: meshes/rock.obj\n    texture: rock.png\nskybox:\n  prefix: sky/cube-\n"
        )
        .unwrap();

        let config = SceneConfig::load(&path).unwrap();
        let rock = &config.objects[0];
        assert_eq!(
            rock.mesh,
            MeshSource::File {
                path: dir.path().join("meshes/rock.obj")
            }
        );
        assert_eq!(rock.texture, Some(dir.path().join("rock.png")));
        let sky = config.skybox.unwrap();
        assert_eq!(sky.extension, "png");
        assert!(sky.prefix.ends_with("cube-"));
        assert!(Path::new(&sky.prefix).is_absolute());
    }

    #[test]
    fn load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, r#"{ "rotation_speed": 1.5, "objects": [] }"#).unwrap();
        let config = SceneConfig::load(&path).unwrap();
        assert_eq!(config.rotation_speed, 1.5);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            SceneConfig::load(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
