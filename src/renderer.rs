//! Per-frame orchestration.
//!
//! The renderer owns every GPU-facing piece: context, frame ring, upload
//! pipeline, registries, object table, deletion queue and the streaming
//! integrator. One call to [`Renderer::render_frame`] runs the whole frame
//! sequence: integrate any finished terrain load, wait for the ring slot,
//! write this frame's uniforms, acquire, record, submit, present, advance.
//! Any GPU failure inside that sequence is fatal; there is no partial-frame
//! recovery once recording has begun.

use std::iter;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use cgmath::Matrix4;

use crate::cleanup::{self, ResourceQueue};
use crate::context::Context;
use crate::data_structures::mesh::{MeshAsset, MeshData};
use crate::data_structures::object::{ObjectHandle, RenderObject, RenderObjectTable};
use crate::frame::{BindingLayouts, FrameRing, SceneData};
use crate::pipelines::{Material, mesh::mk_mesh_pipeline, terrain::mk_terrain_pipeline};
use crate::registry::NamedRegistry;
use crate::streaming::{StreamingIntegrator, TerrainPoll};
use crate::terrain::{AsyncTerrainLoader, TerrainRequest};
use crate::upload::UploadPipeline;

/// Material name the streamed terrain is registered under. A reload
/// overwrites it, which the registry logs and allows.
pub const TERRAIN_NAME: &str = "terrain";

/// Material name for the untextured vehicle model.
pub const VEHICLE_MATERIAL: &str = "vehicle";

pub struct Renderer {
    pub ctx: Context,
    layouts: BindingLayouts,
    frames: FrameRing,
    upload: UploadPipeline,
    cleanup: ResourceQueue,
    meshes: NamedRegistry<MeshAsset>,
    materials: NamedRegistry<Material>,
    objects: RenderObjectTable,
    integrator: StreamingIntegrator,
    terrain_pipeline: wgpu::RenderPipeline,
}

impl Renderer {
    pub async fn new(
        window: Arc<winit::window::Window>,
        loader: AsyncTerrainLoader,
    ) -> Result<Self> {
        let ctx = Context::new(window).await?;
        let layouts = BindingLayouts::new(&ctx.device);
        let mut cleanup = ResourceQueue::new();
        let frames = FrameRing::new(&ctx.device, &layouts, &mut cleanup);
        let upload = UploadPipeline::new(ctx.device.clone(), ctx.queue.clone());

        let mesh_pipeline = mk_mesh_pipeline(&ctx.device, &ctx.config, &layouts);
        let terrain_pipeline = mk_terrain_pipeline(&ctx.device, &ctx.config, &layouts);

        let mut materials = NamedRegistry::new();
        materials.insert(
            VEHICLE_MATERIAL,
            Material::untextured(VEHICLE_MATERIAL, mesh_pipeline),
        );

        Ok(Self {
            ctx,
            layouts,
            frames,
            upload,
            cleanup,
            meshes: NamedRegistry::new(),
            materials,
            objects: RenderObjectTable::new(),
            integrator: StreamingIntegrator::new(loader),
            terrain_pipeline,
        })
    }

    pub fn material(&self, name: &str) -> Option<Arc<Material>> {
        self.materials.get(name)
    }

    pub fn mesh(&self, name: &str) -> Option<Arc<MeshAsset>> {
        self.meshes.get(name)
    }

    /// Upload CPU mesh data through the staging pipeline and register the
    /// resulting GPU mesh under `name`.
    pub fn upload_mesh(&mut self, name: &str, data: &MeshData) -> Result<Arc<MeshAsset>> {
        let vertex_buffer = self.upload.upload_buffer(
            bytemuck::cast_slice(&data.vertices),
            wgpu::BufferUsages::VERTEX,
            &format!("{} vertex buffer", name),
            &mut self.cleanup,
        )?;
        let index_buffer = self.upload.upload_buffer(
            bytemuck::cast_slice(&data.indices),
            wgpu::BufferUsages::INDEX,
            &format!("{} index buffer", name),
            &mut self.cleanup,
        )?;
        Ok(self.meshes.insert(
            name,
            MeshAsset {
                name: name.to_string(),
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            },
        ))
    }

    /// Append a new render object. The handle stays valid for the lifetime
    /// of the renderer.
    pub fn add_object(&mut self, mesh: Arc<MeshAsset>, material: Arc<Material>) -> ObjectHandle {
        let (handle, object) = self.objects.allocate();
        object.mesh = Some(mesh);
        object.material = Some(material);
        handle
    }

    pub fn object_mut(&mut self, handle: ObjectHandle) -> &mut RenderObject {
        self.objects.get_mut(handle)
    }

    /// Start streaming terrain for the given request. Returns false if a
    /// load is already outstanding.
    pub fn begin_terrain_load(
        &mut self,
        handle: &tokio::runtime::Handle,
        request: TerrainRequest,
    ) -> bool {
        self.integrator.begin_load(handle, request)
    }

    pub fn is_terrain_loading(&self) -> bool {
        self.integrator.is_loading()
    }

    /// Poll the outstanding terrain load and, if one just finished, move it
    /// into the live scene. Runs before any command recording so the upload
    /// pipeline never overlaps the frame's command pool.
    fn integrate_terrain(&mut self) -> Result<()> {
        match self.integrator.poll() {
            TerrainPoll::Idle | TerrainPoll::Pending => Ok(()),
            TerrainPoll::Failed(e) => {
                log::warn!("terrain load failed, scene unchanged: {:#}", e);
                Ok(())
            }
            TerrainPoll::Ready(bundle) => {
                let index_count = bundle.mesh.indices.len();
                let mesh = self.upload_mesh(TERRAIN_NAME, &bundle.mesh)?;
                let tint =
                    self.upload
                        .upload_texture(&bundle.tint, "terrain tint", &mut self.cleanup)?;
                let material = self.materials.insert(
                    TERRAIN_NAME,
                    Material::textured(
                        TERRAIN_NAME,
                        self.terrain_pipeline.clone(),
                        &self.ctx.device,
                        &self.layouts.material_texture,
                        &tint,
                    ),
                );
                let handle = self.add_object(mesh, material);
                log::info!(
                    "terrain integrated as object {} ({} indices)",
                    handle.index(),
                    index_count
                );
                Ok(())
            }
        }
    }

    /// Render one frame. Fatal on any GPU error, including a failed
    /// swapchain acquire; the caller aborts rather than retrying.
    pub fn render_frame(&mut self, view: Matrix4<f32>, proj: Matrix4<f32>) -> Result<()> {
        self.integrate_terrain()?;

        let slot = self.frames.begin_frame(&self.ctx.device)?;

        let scene = SceneData::new(view, proj, self.frames.frame_counter());
        self.frames.write_scene(&self.ctx.queue, slot, &scene);
        self.frames.write_objects(&self.ctx.queue, slot, &self.objects);

        let output = self
            .ctx
            .surface
            .get_current_texture()
            .map_err(|e| anyhow::anyhow!("acquiring the surface texture failed: {:?}", e))?;
        let color_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(
                0,
                self.frames.global_bind_group(slot),
                &[self.frames.scene_offset(slot)],
            );
            render_pass.set_bind_group(1, self.frames.object_bind_group(slot), &[]);

            // Walk the table in order, rebinding material and mesh only when
            // they change from the previous draw. The instance index selects
            // the object's entry in the set-1 storage array.
            let mut last_material: Option<&Arc<Material>> = None;
            let mut last_mesh: Option<&Arc<MeshAsset>> = None;
            for (index, object) in self.objects.iter().enumerate() {
                let (Some(mesh), Some(material)) = (&object.mesh, &object.material) else {
                    log::warn!("render object {} has no mesh or material yet, skipping", index);
                    continue;
                };
                if !last_material.is_some_and(|prev| Arc::ptr_eq(prev, material)) {
                    render_pass.set_pipeline(&material.pipeline);
                    if let Some(texture_bind_group) = &material.texture_bind_group {
                        render_pass.set_bind_group(2, texture_bind_group, &[]);
                    }
                    last_material = Some(material);
                }
                if !last_mesh.is_some_and(|prev| Arc::ptr_eq(prev, mesh)) {
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    last_mesh = Some(mesh);
                }
                let instance = index as u32;
                render_pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
            }
        }

        let submission = self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        self.frames.end_frame(slot, submission);
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    /// Drain all in-flight frames, then release every registered GPU
    /// resource in reverse creation order.
    pub fn shutdown(&mut self) -> Result<()> {
        self.frames
            .wait_idle(&self.ctx.device)
            .context("waiting for the GPU before teardown")?;
        self.cleanup.flush(cleanup::release);
        Ok(())
    }
}
