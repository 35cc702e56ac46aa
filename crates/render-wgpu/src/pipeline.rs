use phongview_render::{DepthCompare, PassState};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub layout: &'a wgpu::PipelineLayout,
    pub shader: &'a wgpu::ShaderModule,
    pub vs_entry: &'a str,
    pub fs_entry: &'a str,
    pub vertex: wgpu::VertexBufferLayout<'a>,
    pub color_format: wgpu::TextureFormat,
    pub state: PassState,
}

pub fn depth_stencil(state: &PassState) -> Option<wgpu::DepthStencilState> {
    if !state.depth_test {
        return None;
    }
    Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: state.depth_write,
        depth_compare: match state.depth_compare {
            DepthCompare::Less => wgpu::CompareFunction::Less,
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        },
        stencil: Default::default(),
        bias: Default::default(),
    })
}

pub fn blend(state: &PassState) -> wgpu::BlendState {
    if state.alpha_blend {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    }
}

/// Render pipeline whose fixed-function state comes from a frame stage.
pub fn build(device: &wgpu::Device, desc: &PipelineDesc) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some(desc.vs_entry),
            compilation_options: Default::default(),
            buffers: &[desc.vertex.clone()],
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some(desc.fs_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.color_format,
                blend: Some(blend(&desc.state)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.state.cull_back_faces.then_some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: depth_stencil(&desc.state),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
