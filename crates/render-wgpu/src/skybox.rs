use phongview_assets::ImageData;
use phongview_render::{SkyboxSettings, Stage};
use wgpu::util::DeviceExt;

use crate::RenderError;
use crate::mesh::{GpuMesh, Vertex};
use crate::pipeline::{self, PipelineDesc};
use crate::shaders;
use crate::texture::{GpuTexture, sampled_layout};

/// Cube-mapped background drawn before any scene geometry.
pub struct Skybox {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    cube: GpuMesh,
}

impl Skybox {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        globals_layout: &wgpu::BindGroupLayout,
        settings: &SkyboxSettings,
    ) -> Result<Self, RenderError> {
        let faces = phongview_assets::load_cube_faces(&settings.prefix, &settings.extension)
            .map_err(RenderError::Skybox)?;
        let skybox = Self::from_faces(device, queue, globals_layout, &faces);
        tracing::info!(
            "loaded skybox {}*.{} ({}px faces)",
            settings.prefix,
            settings.extension,
            faces[0].width
        );
        Ok(skybox)
    }

    pub fn from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        globals_layout: &wgpu::BindGroupLayout,
        faces: &[ImageData; 6],
    ) -> Self {
        let size = faces[0].width.max(1);
        let data: Vec<u8> = faces.iter().flat_map(|f| f.rgba.iter().copied()).collect();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("skybox_texture"),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: GpuTexture::FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("skybox_view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let layout = sampled_layout(device, "skybox_layout", wgpu::TextureViewDimension::Cube);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKY_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky_pipeline_layout"),
            bind_group_layouts: &[globals_layout, &layout],
            push_constant_ranges: &[],
        });
        let pipeline = pipeline::build(
            device,
            &PipelineDesc {
                label: "sky_pipeline",
                layout: &pipeline_layout,
                shader: &shader,
                vs_entry: "vs_sky",
                fs_entry: "fs_sky",
                vertex: Vertex::layout(),
                color_format: GpuTexture::FORMAT,
                state: Stage::Sky.pass_state(),
            },
        );

        let cube = GpuMesh::upload(device, &phongview_assets::cube(2.0));

        Self {
            pipeline,
            bind_group,
            cube,
        }
    }

    /// Globals must already be bound at group 0.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        self.cube.draw(pass);
    }
}
