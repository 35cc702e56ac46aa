//! CPU reference for the lighting, fog and post-processing shader maths.
//!
//! The WGSL in the wgpu backend evaluates the same formulas per vertex and per
//! fragment; these functions exist so the maths can be unit tested and reused
//! by tools.

use glam::{Vec3, Vec4, Vec4Swizzles};
use serde::{Deserialize, Serialize};

use crate::LightSettings;

/// Distance used for fog and draw sorting: planar depth along the view axis,
/// not the radial distance to the eye.
pub fn view_depth(eye_position: Vec3) -> f32 {
    -eye_position.z
}

/// Linear fog amount in `[0, 1]` for a [`view_depth`].
pub fn fog_factor(distance: f32, near: f32, far: f32) -> f32 {
    ((distance - near) / (far - near)).clamp(0.0, 1.0)
}

/// Ambient + diffuse + Blinn-Phong specular.
///
/// All vectors point away from the surface and must be normalized.
pub fn phong(
    normal: Vec3,
    to_light: Vec3,
    to_viewer: Vec3,
    light: &LightSettings,
    material_color: Vec3,
) -> Vec3 {
    let diffuse = light.diffuse_intensity * normal.dot(to_light).max(0.0);
    let half = (to_light + to_viewer).normalize_or_zero();
    let specular =
        light.specular_intensity * normal.dot(half).max(0.0).powf(light.shininess);
    light.ambient_intensity * material_color
        + diffuse * light.color * material_color
        + specular * light.specular_color
}

/// Final fragment colour, or `None` when fog swallows the fragment entirely.
pub fn shade_fragment(
    lit: Vec3,
    texel: Vec4,
    fog: f32,
    fog_color: Vec3,
    opacity: f32,
) -> Option<Vec4> {
    if fog >= 1.0 {
        return None;
    }
    let rgb = (lit * texel.xyz()).lerp(fog_color, fog);
    let alpha = texel.w * opacity * (1.0 - fog);
    Some(rgb.extend(alpha))
}

/// Full-screen effect applied when the off-screen frame is copied to the
/// window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostEffect {
    #[default]
    Passthrough,
    /// Desaturate, then tint brown.
    Sepia,
}

impl PostEffect {
    pub const ALL: [PostEffect; 2] = [PostEffect::Passthrough, PostEffect::Sepia];

    pub const SEPIA_TINT: Vec3 = Vec3::new(1.0, 0.75, 0.5);

    /// Index passed to the post-processing shader.
    pub fn shader_index(self) -> u32 {
        match self {
            PostEffect::Passthrough => 0,
            PostEffect::Sepia => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PostEffect::Passthrough => "passthrough",
            PostEffect::Sepia => "sepia",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|e| *e == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn apply(self, rgb: Vec3) -> Vec3 {
        match self {
            PostEffect::Passthrough => rgb,
            PostEffect::Sepia => {
                let intensity = (rgb.x + rgb.y + rgb.z) / 3.0;
                Vec3::splat(intensity) * Self::SEPIA_TINT
            }
        }
    }
}

impl std::str::FromStr for PostEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown post effect '{s}' (expected passthrough or sepia)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_is_clamped_linear() {
        assert_eq!(fog_factor(0.5, 1.0, 50.0), 0.0);
        assert_eq!(fog_factor(80.0, 1.0, 50.0), 1.0);
        assert!((fog_factor(25.5, 1.0, 50.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fog_depth_ignores_lateral_offset() {
        let ahead = Vec3::new(0.0, 0.0, -30.0);
        let off_axis = Vec3::new(20.0, -10.0, -30.0);
        assert_eq!(view_depth(ahead), 30.0);
        assert_eq!(view_depth(off_axis), view_depth(ahead));
        assert_eq!(
            fog_factor(view_depth(off_axis), 1.0, 50.0),
            fog_factor(view_depth(ahead), 1.0, 50.0)
        );
    }

    #[test]
    fn unlit_side_gets_ambient_only() {
        let light = LightSettings::default();
        let color = phong(Vec3::Y, -Vec3::Y, Vec3::Z, &light, Vec3::ONE);
        assert!((color - Vec3::splat(light.ambient_intensity)).length() < 1e-6);
    }

    #[test]
    fn head_on_light_saturates() {
        let light = LightSettings::default();
        let color = phong(Vec3::Z, Vec3::Z, Vec3::Z, &light, Vec3::ONE);
        let expected =
            light.ambient_intensity + light.diffuse_intensity + light.specular_intensity;
        assert!((color - Vec3::splat(expected)).length() < 1e-5);
    }

    #[test]
    fn full_fog_discards() {
        assert!(shade_fragment(Vec3::ONE, Vec4::ONE, 1.0, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn fog_fades_colour_and_alpha() {
        let out = shade_fragment(
            Vec3::ONE,
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            0.5,
            Vec3::new(0.0, 0.0, 1.0),
            0.8,
        )
        .unwrap();
        assert!((out.xyz() - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-6);
        assert!((out.w - 0.4).abs() < 1e-6);
    }

    #[test]
    fn sepia_tints_grey() {
        let out = PostEffect::Sepia.apply(Vec3::new(0.3, 0.6, 0.9));
        assert!((out - Vec3::new(0.6, 0.45, 0.3)).length() < 1e-6);
        assert_eq!(PostEffect::Passthrough.apply(Vec3::ONE), Vec3::ONE);
    }

    #[test]
    fn effects_cycle_and_parse() {
        assert_eq!(PostEffect::Passthrough.next(), PostEffect::Sepia);
        assert_eq!(PostEffect::Sepia.next(), PostEffect::Passthrough);
        assert_eq!("SEPIA".parse::<PostEffect>().unwrap(), PostEffect::Sepia);
        assert!("bloom".parse::<PostEffect>().is_err());
    }
}
