use crate::data_structures::texture::Texture;
use crate::frame::BindingLayouts;
use crate::pipelines::mk_render_pipeline;

/// Pipeline for untextured meshes (the vehicle model). Binds only the two
/// frame-level sets: per-frame globals and the per-object transform array.
pub fn mk_mesh_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &BindingLayouts,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh pipeline layout"),
        bind_group_layouts: &[&layouts.global, &layouts.objects],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("mesh shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("mesh_shader.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &pipeline_layout,
        config.format,
        Some(Texture::DEPTH_FORMAT),
        shader,
        "mesh pipeline",
    )
}
