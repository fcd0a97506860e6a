use crate::data_structures::texture::Texture;
use crate::frame::BindingLayouts;
use crate::pipelines::mk_render_pipeline;

/// Pipeline for textured terrain: the two frame-level sets plus the material
/// texture set (2) holding the hypsometric tint.
pub fn mk_terrain_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &BindingLayouts,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("terrain pipeline layout"),
        bind_group_layouts: &[&layouts.global, &layouts.objects, &layouts.material_texture],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("terrain shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("terrain_shader.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &pipeline_layout,
        config.format,
        Some(Texture::DEPTH_FORMAT),
        shader,
        "terrain pipeline",
    )
}
