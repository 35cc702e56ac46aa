use bytemuck::{Pod, Zeroable};
use phongview_render::{PostEffect, Stage};
use wgpu::util::DeviceExt;

use crate::mesh::{GpuMesh, Vertex};
use crate::pipeline::{self, DEPTH_FORMAT, PipelineDesc};
use crate::shaders;
use crate::texture::GpuTexture;

/// Colour + depth attachments the scene is rendered into before post-processing.
pub struct OffscreenTarget {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    pub const COLOR_FORMAT: wgpu::TextureFormat = GpuTexture::FORMAT;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            color: color.create_view(&Default::default()),
            depth: depth.create_view(&Default::default()),
            width,
            height,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct EffectUniform {
    mode: u32,
    _pad: [u32; 3],
}

impl EffectUniform {
    fn new(effect: PostEffect) -> Self {
        Self {
            mode: effect.shader_index(),
            _pad: [0; 3],
        }
    }
}

/// Draws the off-screen colour target onto the surface through a [`PostEffect`].
pub struct PostProcess {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    effect_buffer: wgpu::Buffer,
    quad: GpuMesh,
    effect: PostEffect,
}

impl PostProcess {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        target: &OffscreenTarget,
        effect: PostEffect,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let effect_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("post_effect"),
            contents: bytemuck::bytes_of(&EffectUniform::new(effect)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::POST_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = pipeline::build(
            device,
            &PipelineDesc {
                label: "post_pipeline",
                layout: &pipeline_layout,
                shader: &shader,
                vs_entry: "vs_post",
                fs_entry: "fs_post",
                vertex: Vertex::layout(),
                color_format: surface_format,
                state: Stage::PostProcess.pass_state(),
            },
        );

        let bind_group = Self::create_bind_group(device, &layout, &sampler, &effect_buffer, target);
        let quad = GpuMesh::upload(device, &phongview_assets::fullscreen_quad());

        Self {
            pipeline,
            layout,
            bind_group,
            sampler,
            effect_buffer,
            quad,
            effect,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        effect_buffer: &wgpu::Buffer,
        target: &OffscreenTarget,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: effect_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Rebind after the off-screen target was recreated.
    pub fn set_target(&mut self, device: &wgpu::Device, target: &OffscreenTarget) {
        self.bind_group = Self::create_bind_group(
            device,
            &self.layout,
            &self.sampler,
            &self.effect_buffer,
            target,
        );
    }

    pub fn effect(&self) -> PostEffect {
        self.effect
    }

    pub fn set_effect(&mut self, queue: &wgpu::Queue, effect: PostEffect) {
        if effect != self.effect {
            tracing::info!("post effect: {}", effect.name());
        }
        self.effect = effect;
        queue.write_buffer(
            &self.effect_buffer,
            0,
            bytemuck::bytes_of(&EffectUniform::new(effect)),
        );
    }

    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("post_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        self.quad.draw(&mut pass);
    }
}
