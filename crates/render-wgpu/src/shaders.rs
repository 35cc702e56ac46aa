/// Lit, textured, fogged scene geometry. Lighting is evaluated in eye space.
pub const SCENE_SHADER: &str = r#"
struct Globals {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    specular_color: vec4<f32>,
    fog_color: vec4<f32>,
    // ambient, diffuse, specular, shininess
    lighting: vec4<f32>,
    // near, far
    fog: vec4<f32>,
};

struct Object {
    model_view: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    // rgb colour, a opacity
    material: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> object: Object;
@group(2) @binding(0) var base_texture: texture_2d<f32>;
@group(2) @binding(1) var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) eye_position: vec3<f32>,
    @location(1) eye_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let eye = object.model_view * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = globals.projection * eye;
    out.eye_position = eye.xyz;
    out.eye_normal = (object.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(base_texture, base_sampler, in.uv);

    let n = normalize(in.eye_normal);
    let l = normalize(globals.light_position.xyz - in.eye_position);
    let v = normalize(-in.eye_position);
    let h = normalize(l + v);

    let material = object.material.rgb;
    let diffuse = globals.lighting.y * max(dot(n, l), 0.0);
    let specular = globals.lighting.z * pow(max(dot(n, h), 0.0), globals.lighting.w);
    let lit = globals.lighting.x * material
        + diffuse * globals.light_color.rgb * material
        + specular * globals.specular_color.rgb;

    let depth = -in.eye_position.z;
    let fog = clamp((depth - globals.fog.x) / (globals.fog.y - globals.fog.x), 0.0, 1.0);
    if fog >= 1.0 {
        discard;
    }

    let rgb = mix(lit * texel.rgb, globals.fog_color.rgb, fog);
    return vec4<f32>(rgb, texel.a * object.material.a * (1.0 - fog));
}
"#;

/// Cube-mapped sky drawn at the far plane.
pub const SKY_SHADER: &str = r#"
struct Globals {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var sky_texture: texture_cube<f32>;
@group(1) @binding(1) var sky_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_sky(vertex: VertexInput) -> VertexOutput {
    // Rotation only: the sky never moves with the camera.
    let rotation = mat4x4<f32>(
        vec4<f32>(globals.view[0].xyz, 0.0),
        vec4<f32>(globals.view[1].xyz, 0.0),
        vec4<f32>(globals.view[2].xyz, 0.0),
        vec4<f32>(0.0, 0.0, 0.0, 1.0),
    );
    let clip = globals.projection * rotation * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = clip.xyww;
    out.direction = vertex.position;
    return out;
}

@fragment
fn fs_sky(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, in.direction);
}
"#;

/// Copies the off-screen colour target to the surface through an effect.
pub const POST_SHADER: &str = r#"
struct Effect {
    mode: u32,
};

@group(0) @binding(0) var frame_texture: texture_2d<f32>;
@group(0) @binding(1) var frame_sampler: sampler;
@group(0) @binding(2) var<uniform> effect: Effect;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_post(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(vertex.position.xy, 0.0, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_post(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(frame_texture, frame_sampler, in.uv);
    if effect.mode == 1u {
        let intensity = (color.r + color.g + color.b) / 3.0;
        return vec4<f32>(vec3<f32>(intensity) * vec3<f32>(1.0, 0.75, 0.5), 1.0);
    }
    return vec4<f32>(color.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_present() {
        assert!(SCENE_SHADER.contains("fn vs_main") && SCENE_SHADER.contains("fn fs_main"));
        assert!(SKY_SHADER.contains("fn vs_sky") && SKY_SHADER.contains("fn fs_sky"));
        assert!(POST_SHADER.contains("fn vs_post") && POST_SHADER.contains("fn fs_post"));
    }

    #[test]
    fn fog_uses_view_depth() {
        assert!(SCENE_SHADER.contains("let depth = -in.eye_position.z;"));
        assert!(!SCENE_SHADER.contains("length(in.eye_position)"));
    }

    #[test]
    fn sky_is_pinned_to_far_plane() {
        assert!(SKY_SHADER.contains("clip.xyww"));
    }

    #[test]
    fn sepia_tint_matches_cpu_reference() {
        let tint = phongview_render::PostEffect::SEPIA_TINT;
        assert_eq!(tint.to_array(), [1.0, 0.75, 0.5]);
        assert!(POST_SHADER.contains("vec3<f32>(1.0, 0.75, 0.5)"));
        assert_eq!(phongview_render::PostEffect::Sepia.shader_index(), 1);
        assert!(POST_SHADER.contains("effect.mode == 1u"));
    }
}
