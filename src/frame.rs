//! The frame ring buffer and the two-set binding model.
//!
//! Two frame slots are reused in rotation, selected by `frame counter % 2`.
//! Each slot keeps the GPU resources one in-flight frame needs: its per-object
//! storage buffer, its bind groups, and the submission index of its last use,
//! which acts as the slot's fence. Waiting on that index before reusing a slot
//! is the backpressure that stops the CPU from running more than two frames
//! ahead of the GPU.
//!
//! Bindings are split in two sets so a camera move does not re-upload the
//! object array: set 0 is one dynamic uniform binding with the per-frame
//! [`SceneData`], offset-indexed into a ring-buffered region of a single
//! uniform buffer; set 1 is a storage binding with one [`ObjectData`] entry
//! per table slot, rewritten in full each frame in table order and selected in
//! the shader by the draw's instance index. Per-frame upload cost is bounded
//! by the live object count, not the scene size.

use anyhow::{Context as _, Result};
use cgmath::Matrix4;
use instant::Duration;

use crate::cleanup::{GpuResource, ResourceQueue};
use crate::data_structures::object::RenderObjectTable;
use crate::upload::align_up;

/// Number of frames that may be in flight at once.
pub const FRAME_OVERLAP: usize = 2;

/// Capacity of the per-frame object array. The table is append-only, so
/// exceeding this is a programmer error rather than a runtime condition.
pub const MAX_OBJECTS: usize = 10_000;

/// How long to wait for the GPU to release a frame slot before giving up.
const FRAME_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-frame global data: camera matrices plus ambient scene parameters.
/// Rewritten every frame at this slot's offset in the scene uniform region.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneData {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub ambient_color: [f32; 4],
    pub sunlight_direction: [f32; 4],
    pub sunlight_color: [f32; 4],
}

impl SceneData {
    /// Assemble the frame's globals. The ambient tint drifts slowly with the
    /// monotonic frame counter so a paused replay still reads as live.
    pub fn new(view: Matrix4<f32>, proj: Matrix4<f32>, frame_counter: u64) -> Self {
        let t = frame_counter as f32 / 240.0;
        Self {
            view: view.into(),
            proj: proj.into(),
            view_proj: (proj * view).into(),
            ambient_color: [
                0.22 + 0.04 * t.sin(),
                0.22,
                0.24 + 0.04 * t.cos(),
                1.0,
            ],
            sunlight_direction: [-0.4, -0.82, -0.41, 0.0],
            sunlight_color: [1.0, 0.98, 0.92, 1.0],
        }
    }
}

/// One per-object entry in the set-1 storage array.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectData {
    pub model: [[f32; 4]; 4],
}

/// The fixed bind group layouts shared by every pipeline.
#[derive(Debug)]
pub struct BindingLayouts {
    /// Set 0: dynamic uniform with [`SceneData`].
    pub global: wgpu::BindGroupLayout,
    /// Set 1: read-only storage array of [`ObjectData`].
    pub objects: wgpu::BindGroupLayout,
    /// Set 2: texture + sampler, only present on textured materials.
    pub material_texture: wgpu::BindGroupLayout,
}

impl BindingLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let global = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("scene_bind_group_layout"),
        });
        let objects = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("object_bind_group_layout"),
        });
        let material_texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            ],
            label: Some("material_texture_bind_group_layout"),
        });
        Self {
            global,
            objects,
            material_texture,
        }
    }
}

/// GPU resources owned by one ring slot, reused every `FRAME_OVERLAP` frames.
#[derive(Debug)]
struct FrameSlot {
    object_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_bind_group: wgpu::BindGroup,
    /// Fence for the slot's previous use; `None` until first submitted.
    submission: Option<wgpu::SubmissionIndex>,
}

#[derive(Debug)]
pub struct FrameRing {
    slots: Vec<FrameSlot>,
    scene_buffer: wgpu::Buffer,
    scene_stride: u64,
    counter: u64,
}

impl FrameRing {
    pub fn new(device: &wgpu::Device, layouts: &BindingLayouts, cleanup: &mut ResourceQueue) -> Self {
        let scene_stride = align_up(
            std::mem::size_of::<SceneData>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene uniform ring"),
            size: scene_stride * FRAME_OVERLAP as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        cleanup.push(GpuResource::Buffer(scene_buffer.clone()));

        let slots = (0..FRAME_OVERLAP)
            .map(|i| {
                let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("object storage (slot {})", i)),
                    size: (MAX_OBJECTS * std::mem::size_of::<ObjectData>()) as u64,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                cleanup.push(GpuResource::Buffer(object_buffer.clone()));

                let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &layouts.global,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &scene_buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(std::mem::size_of::<SceneData>() as u64),
                        }),
                    }],
                    label: Some("scene_bind_group"),
                });
                let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &layouts.objects,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: object_buffer.as_entire_binding(),
                    }],
                    label: Some("object_bind_group"),
                });
                FrameSlot {
                    object_buffer,
                    global_bind_group,
                    object_bind_group,
                    submission: None,
                }
            })
            .collect();

        Self {
            slots,
            scene_buffer,
            scene_stride,
            counter: 0,
        }
    }

    /// Monotonic frame counter; drives slot selection and ambient animation.
    pub fn frame_counter(&self) -> u64 {
        self.counter
    }

    pub fn current_slot(&self) -> usize {
        (self.counter % FRAME_OVERLAP as u64) as usize
    }

    /// Wait until the GPU is done with the current slot's previous use.
    ///
    /// Returns the slot index ready for recording. A wait failure is fatal to
    /// the frame loop and is propagated, not recovered.
    pub fn begin_frame(&mut self, device: &wgpu::Device) -> Result<usize> {
        let slot = self.current_slot();
        if let Some(submission) = self.slots[slot].submission.take() {
            device
                .poll(wgpu::PollType::Wait {
                    submission_index: Some(submission),
                    timeout: Some(FRAME_WAIT_TIMEOUT),
                })
                .map_err(|e| anyhow::anyhow!("{:?}", e))
                .context("waiting for previous frame in this slot")?;
        }
        Ok(slot)
    }

    /// Record the submission fence of the slot just submitted and advance the
    /// frame counter.
    pub fn end_frame(&mut self, slot: usize, submission: wgpu::SubmissionIndex) {
        self.slots[slot].submission = Some(submission);
        self.counter += 1;
    }

    /// Byte offset of this slot's region in the scene uniform ring.
    pub fn scene_offset(&self, slot: usize) -> u32 {
        (self.scene_stride * slot as u64) as u32
    }

    pub fn write_scene(&self, queue: &wgpu::Queue, slot: usize, scene: &SceneData) {
        queue.write_buffer(
            &self.scene_buffer,
            self.scene_stride * slot as u64,
            bytemuck::bytes_of(scene),
        );
    }

    /// Rewrite this slot's object array in table order.
    pub fn write_objects(&self, queue: &wgpu::Queue, slot: usize, table: &RenderObjectTable) {
        assert!(
            table.len() <= MAX_OBJECTS,
            "render object table exceeds the per-frame storage capacity of {}",
            MAX_OBJECTS
        );
        if table.is_empty() {
            return;
        }
        let data: Vec<ObjectData> = table
            .iter()
            .map(|object| ObjectData {
                model: object.transform.into(),
            })
            .collect();
        queue.write_buffer(
            &self.slots[slot].object_buffer,
            0,
            bytemuck::cast_slice(&data),
        );
    }

    pub fn global_bind_group(&self, slot: usize) -> &wgpu::BindGroup {
        &self.slots[slot].global_bind_group
    }

    pub fn object_bind_group(&self, slot: usize) -> &wgpu::BindGroup {
        &self.slots[slot].object_bind_group
    }

    /// Block until every slot's outstanding work has completed. Called before
    /// flushing the deletion queue at shutdown.
    pub fn wait_idle(&mut self, device: &wgpu::Device) -> Result<()> {
        for slot in &mut self.slots {
            if let Some(submission) = slot.submission.take() {
                device
                    .poll(wgpu::PollType::Wait {
                        submission_index: Some(submission),
                        timeout: Some(FRAME_WAIT_TIMEOUT),
                    })
                    .map_err(|e| anyhow::anyhow!("{:?}", e))
                    .context("draining in-flight frames at shutdown")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn scene_data_layout_is_uniform_compatible() {
        // Three mat4s plus three vec4s, 16-byte aligned throughout.
        assert_eq!(std::mem::size_of::<SceneData>(), 3 * 64 + 3 * 16);
        assert_eq!(std::mem::size_of::<SceneData>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectData>(), 64);
    }

    #[test]
    fn view_proj_is_the_matrix_product() {
        let view = Matrix4::from_translation([0.0, 0.0, -5.0].into());
        let proj = Matrix4::from_scale(2.0);
        let scene = SceneData::new(view, proj, 0);
        let expected: [[f32; 4]; 4] = (proj * view).into();
        assert_eq!(scene.view_proj, expected);
    }

    #[test]
    fn identity_matrices_produce_identity_view_proj() {
        let scene = SceneData::new(Matrix4::identity(), Matrix4::identity(), 17);
        let expected: [[f32; 4]; 4] = Matrix4::identity().into();
        assert_eq!(scene.view_proj, expected);
    }
}
