//! Render pipeline construction and materials.
//!
//! - `mesh` is the untextured pipeline used for the vehicle model
//! - `terrain` is the textured pipeline used for streamed terrain
//!
//! Both share the common pipeline plumbing in [`mk_render_pipeline`] and the
//! two fixed binding sets from [`crate::frame::BindingLayouts`].

pub mod mesh;
pub mod terrain;

use crate::data_structures::mesh::Vertex as _;
use crate::data_structures::texture::Texture;

/// A named material: pipeline plus, for textured materials, the bind group
/// holding the texture view and sampler (set 2).
///
/// Materials live in the registry and are looked up by name; re-registering a
/// name overwrites with a logged warning (see [`crate::registry`]).
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub pipeline: wgpu::RenderPipeline,
    pub texture_bind_group: Option<wgpu::BindGroup>,
}

impl Material {
    pub fn untextured(name: &str, pipeline: wgpu::RenderPipeline) -> Self {
        Self {
            name: name.to_string(),
            pipeline,
            texture_bind_group: None,
        }
    }

    /// Build a textured material from a pipeline and an uploaded texture.
    pub fn textured(
        name: &str,
        pipeline: wgpu::RenderPipeline,
        device: &wgpu::Device,
        texture_layout: &wgpu::BindGroupLayout,
        texture: &Texture,
    ) -> Self {
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some(&format!("{} texture bind group", name)),
        });
        Self {
            name: name.to_string(),
            pipeline,
            texture_bind_group: Some(texture_bind_group),
        }
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    shader: wgpu::ShaderModuleDescriptor,
    label: &str,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[crate::data_structures::mesh::MeshVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState {
                    alpha: wgpu::BlendComponent::REPLACE,
                    color: wgpu::BlendComponent::REPLACE,
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
