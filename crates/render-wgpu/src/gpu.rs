use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use phongview_assets::AssetError;
use phongview_render::{FramePlan, PostEffect, Scene, SceneConfig, SceneObject, Stage};
use wgpu::util::DeviceExt;

use crate::camera::FlyCamera;
use crate::mesh::{GpuMesh, Vertex, mesh_for_source};
use crate::pipeline::{self, PipelineDesc};
use crate::postprocess::{OffscreenTarget, PostProcess};
use crate::shaders;
use crate::skybox::Skybox;
use crate::texture::GpuTexture;

/// Errors from building GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("object '{name}': {source}")]
    Object {
        name: String,
        #[source]
        source: AssetError,
    },
    #[error("skybox: {0}")]
    Skybox(#[source] AssetError),
}

/// Per-frame values shared by every draw. Mirrors `Globals` in the scene shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    specular_color: [f32; 4],
    fog_color: [f32; 4],
    lighting: [f32; 4],
    fog: [f32; 4],
}

impl Globals {
    fn new(config: &SceneConfig, view: Mat4, projection: Mat4) -> Self {
        let light = &config.light;
        let fog = &config.fog;
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            // Already in eye space: the light rides with the camera.
            light_position: light.position.extend(1.0).to_array(),
            light_color: light.color.extend(1.0).to_array(),
            specular_color: light.specular_color.extend(1.0).to_array(),
            fog_color: fog.color.extend(1.0).to_array(),
            lighting: [
                light.ambient_intensity,
                light.diffuse_intensity,
                light.specular_intensity,
                light.shininess,
            ],
            fog: [fog.near, fog.far, 0.0, 0.0],
        }
    }
}

/// Mirrors `Object` in the scene shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ObjectUniform {
    model_view: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    material: [f32; 4],
}

/// GPU resources for one scene object.
struct GpuObject {
    mesh: GpuMesh,
    uniform: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// wgpu renderer for a [`Scene`]: sky, opaque and transparent passes into an
/// off-screen target, then a post-processing pass onto the surface.
pub struct SceneRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    white: GpuTexture,
    /// Indexed like the scene's objects; `None` when loading failed.
    objects: Vec<Option<GpuObject>>,
    skybox: Option<Skybox>,
    target: OffscreenTarget,
    post: PostProcess,
    clear_color: wgpu::Color,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &Scene,
    ) -> Self {
        let _span = tracing::info_span!("scene_build").entered();
        let config = &scene.config;

        let globals_layout = uniform_layout(device, "globals_layout");
        let object_layout = uniform_layout(device, "object_layout");
        let texture_layout = GpuTexture::bind_group_layout(device);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::new(config, Mat4::IDENTITY, Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let scene_pipeline = |label: &'static str, stage: Stage| {
            pipeline::build(
                device,
                &PipelineDesc {
                    label,
                    layout: &pipeline_layout,
                    shader: &shader,
                    vs_entry: "vs_main",
                    fs_entry: "fs_main",
                    vertex: Vertex::layout(),
                    color_format: OffscreenTarget::COLOR_FORMAT,
                    state: stage.pass_state(),
                },
            )
        };
        let opaque_pipeline = scene_pipeline("opaque_pipeline", Stage::Opaque);
        let transparent_pipeline = scene_pipeline("transparent_pipeline", Stage::Transparent);

        let skybox = config.skybox.as_ref().and_then(|settings| {
            Skybox::load(device, queue, &globals_layout, settings)
                .inspect_err(|e| tracing::warn!("{e}; rendering without sky"))
                .ok()
        });

        let target = OffscreenTarget::new(device, width, height);
        let post = PostProcess::new(device, surface_format, &target, config.post.effect);

        let clear = config.clear_color;
        let mut renderer = Self {
            opaque_pipeline,
            transparent_pipeline,
            globals_buffer,
            globals_bind_group,
            object_layout,
            texture_layout,
            white: GpuTexture::white(device, queue),
            objects: Vec::new(),
            skybox,
            target,
            post,
            clear_color: wgpu::Color {
                r: clear.x as f64,
                g: clear.y as f64,
                b: clear.z as f64,
                a: 1.0,
            },
        };

        for object in scene.objects() {
            match renderer.upload_object(device, queue, object) {
                Ok(gpu) => renderer.objects.push(Some(gpu)),
                Err(e) => {
                    tracing::warn!("{e}; skipping");
                    renderer.objects.push(None);
                }
            }
        }
        tracing::info!(
            "scene ready: {}/{} objects, sky={}",
            renderer.loaded_count(),
            renderer.objects.len(),
            renderer.skybox.is_some()
        );
        renderer
    }

    fn upload_object(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        object: &SceneObject,
    ) -> Result<GpuObject, RenderError> {
        let mesh = mesh_for_source(&object.mesh).map_err(|source| RenderError::Object {
            name: object.name.clone(),
            source,
        })?;
        let mesh = GpuMesh::upload(device, &mesh);

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{}_uniform", object.name)),
            size: std::mem::size_of::<ObjectUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_bind_group", object.name)),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        let texture = object.texture.as_ref().and_then(|path| {
            match phongview_assets::load_image(path) {
                Ok(image) => Some(GpuTexture::from_image(device, queue, &image, &object.name)),
                Err(e) => {
                    tracing::warn!(
                        "object '{}': texture {}: {e}; using white",
                        object.name,
                        path.display()
                    );
                    None
                }
            }
        });
        let texture_bind_group = texture
            .as_ref()
            .unwrap_or(&self.white)
            .bind_group(device, &self.texture_layout);

        Ok(GpuObject {
            mesh,
            uniform,
            object_bind_group,
            texture_bind_group,
        })
    }

    pub fn loaded_count(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    /// Per scene object, whether its GPU resources exist.
    pub fn loaded_flags(&self) -> Vec<bool> {
        self.objects.iter().map(Option::is_some).collect()
    }

    pub fn has_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    pub fn effect(&self) -> PostEffect {
        self.post.effect()
    }

    pub fn set_effect(&mut self, queue: &wgpu::Queue, effect: PostEffect) {
        self.post.set_effect(queue, effect);
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.target = OffscreenTarget::new(device, width, height);
        self.post.set_target(device, &self.target);
        tracing::debug!("off-screen target resized to {}x{}", self.target.width, self.target.height);
    }

    /// Render one frame into `surface_view`.
    ///
    /// Returns the plan that was drawn, with draws for unloaded objects removed.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        camera: &FlyCamera,
        scene: &Scene,
    ) -> FramePlan {
        let view = camera.view_matrix();
        let mut plan = FramePlan::build(scene, view, self.skybox.is_some());
        plan.retain_objects(|i| matches!(self.objects.get(i), Some(Some(_))));

        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals::new(&scene.config, view, camera.projection_matrix())),
        );
        for stage in [Stage::Opaque, Stage::Transparent] {
            for draw in plan.draws(stage) {
                let Some(Some(gpu)) = self.objects.get(draw.object_index) else {
                    continue;
                };
                let material = &scene.objects()[draw.object_index].material;
                let uniform = ObjectUniform {
                    model_view: draw.model_view.to_cols_array_2d(),
                    normal_matrix: draw.normal_matrix.to_cols_array_2d(),
                    material: material.color.extend(material.opacity).to_array(),
                };
                queue.write_buffer(&gpu.uniform, 0, bytemuck::bytes_of(&uniform));
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.globals_bind_group, &[]);

            for stage in &plan.stages {
                match stage {
                    Stage::Sky => {
                        if let Some(sky) = &self.skybox {
                            sky.draw(&mut pass);
                        }
                    }
                    Stage::Opaque | Stage::Transparent => {
                        let pipeline = if *stage == Stage::Opaque {
                            &self.opaque_pipeline
                        } else {
                            &self.transparent_pipeline
                        };
                        pass.set_pipeline(pipeline);
                        for draw in plan.draws(*stage) {
                            let Some(Some(gpu)) = self.objects.get(draw.object_index) else {
                                continue;
                            };
                            pass.set_bind_group(1, &gpu.object_bind_group, &[]);
                            pass.set_bind_group(2, &gpu.texture_bind_group, &[]);
                            gpu.mesh.draw(&mut pass);
                        }
                    }
                    // Separate pass below: it samples the target this pass writes.
                    Stage::PostProcess => {}
                }
            }
        }
        self.post.draw(&mut encoder, surface_view);

        queue.submit(std::iter::once(encoder.finish()));
        plan
    }
}
