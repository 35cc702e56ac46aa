use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec3};
use phongview_render::{CameraSettings, RenderView};

const PITCH_LIMIT: f32 = 89.0 * PI / 180.0;
const DEFAULT_YAW: f32 = -FRAC_PI_2;

/// First-person fly camera with position, yaw, pitch, and projection parameters.
///
/// Angles are radians. Yaw -90° with pitch 0 looks down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub speed: f32,
    /// Radians per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: DEFAULT_YAW,
            pitch: 0.0,
            fov: 60.0_f32.to_radians(),
            aspect: 1024.0 / 576.0,
            near: 0.1,
            far: 1000.0,
            speed: 5.0,
            sensitivity: 0.1_f32.to_radians(),
        }
    }
}

impl FlyCamera {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            position: settings.position,
            yaw: settings.yaw_degrees.to_radians(),
            pitch: settings
                .pitch_degrees
                .to_radians()
                .clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            speed: settings.speed,
            sensitivity: settings.sensitivity_degrees.to_radians(),
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    /// Point one unit in front of the camera.
    pub fn target(&self) -> Vec3 {
        self.position + self.forward()
    }

    pub fn move_forward(&mut self, dt: f32) {
        self.position += self.forward() * self.speed * dt;
    }

    pub fn move_backward(&mut self, dt: f32) {
        self.position -= self.forward() * self.speed * dt;
    }

    pub fn move_left(&mut self, dt: f32) {
        self.position -= self.right() * self.speed * dt;
    }

    pub fn move_right(&mut self, dt: f32) {
        self.position += self.right() * self.speed * dt;
    }

    pub fn move_up(&mut self, dt: f32) {
        self.position.y += self.speed * dt;
    }

    pub fn move_down(&mut self, dt: f32) {
        self.position.y -= self.speed * dt;
    }

    /// Move along a camera-local axis (x = right, y = world up, z = forward).
    ///
    /// Diagonals are normalized so they are no faster than a single axis.
    pub fn apply_movement(&mut self, local: Vec3, dt: f32) {
        let Some(dir) = local.try_normalize() else {
            return;
        };
        let world = self.right() * dir.x + Vec3::Y * dir.y + self.forward() * dir.z;
        self.position += world * self.speed * dt;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Mouse look. Positive `dy` (mouse down) pitches the view down.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Turn to face `target`. Ignored when `target` is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(dir) = (target - self.position).try_normalize() else {
            return;
        };
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Back to the origin looking down -Z, with a new projection.
    pub fn reset(&mut self, fov_degrees: f32, near: f32, far: f32, aspect: f32) {
        self.position = Vec3::ZERO;
        self.yaw = DEFAULT_YAW;
        self.pitch = 0.0;
        self.fov = fov_degrees.to_radians();
        self.near = near;
        self.far = far;
        self.aspect = aspect;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Snapshot for renderer-agnostic consumers.
    pub fn render_view(&self) -> RenderView {
        RenderView {
            eye: self.position,
            target: self.target(),
            fov_degrees: self.fov.to_degrees(),
        }
    }
}
