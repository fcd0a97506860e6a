//! Synchronous staging uploads into GPU-local memory.
//!
//! The upload path copies CPU data into a freshly mapped staging buffer,
//! records a transfer command, submits it and blocks the calling thread until
//! the GPU signals the submission complete. Staging memory is destroyed right
//! there instead of going through the deferred deletion queue, since the wait
//! already proved the copy finished. Everything here is render-thread only and
//! must never overlap frame recording.

use std::iter;

use anyhow::{Context as _, Result};
use instant::Duration;

use crate::cleanup::{GpuResource, ResourceQueue};
use crate::data_structures::texture::{Texture, TexturePixels, create_default_sampler};

/// How long a blocking upload may take before the process gives up.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Round `size` up to the next multiple of `alignment`.
///
/// Returns `size` unchanged when `alignment` is zero or `size` is already a
/// multiple. Used for the dynamic uniform offset stride and texture row pitch.
pub fn align_up(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        size
    } else {
        size.div_ceil(alignment) * alignment
    }
}

#[derive(Debug)]
pub struct UploadPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl UploadPipeline {
    /// Device and queue handles are internally reference counted, so the
    /// upload pipeline holds plain clones.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Copy `data` into a new GPU-local buffer of the requested usage.
    ///
    /// Blocks until the GPU has finished the copy. The returned buffer is
    /// registered with the deletion queue; the staging buffer is destroyed
    /// before this returns.
    pub fn upload_buffer(
        &self,
        data: &[u8],
        usage: wgpu::BufferUsages,
        label: &str,
        cleanup: &mut ResourceQueue,
    ) -> Result<wgpu::Buffer> {
        let padded_size = align_up(data.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);
        let staging = self.mapped_staging_buffer(padded_size, label);
        staging.slice(..).get_mapped_range_mut()[..data.len()].copy_from_slice(data);
        staging.unmap();

        let destination = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: padded_size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("upload encoder"),
            });
        encoder.copy_buffer_to_buffer(&staging, 0, &destination, 0, padded_size);
        self.submit_and_wait(encoder, label)?;
        staging.destroy();

        cleanup.push(GpuResource::Buffer(destination.clone()));
        Ok(destination)
    }

    /// Copy an RGBA pixel buffer into a new sampled GPU texture.
    ///
    /// Same staging pattern as [`upload_buffer`](Self::upload_buffer); rows
    /// are padded to wgpu's 256-byte copy pitch when necessary.
    pub fn upload_texture(
        &self,
        pixels: &TexturePixels,
        label: &str,
        cleanup: &mut ResourceQueue,
    ) -> Result<Texture> {
        let bytes_per_row = 4 * pixels.width;
        let padded_bytes_per_row = align_up(
            bytes_per_row as u64,
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
        ) as u32;

        let staging_size = padded_bytes_per_row as u64 * pixels.height as u64;
        let staging = self.mapped_staging_buffer(staging_size, label);
        {
            let mut mapped = staging.slice(..).get_mapped_range_mut();
            if padded_bytes_per_row == bytes_per_row {
                mapped[..pixels.rgba.len()].copy_from_slice(&pixels.rgba);
            } else {
                for row in 0..pixels.height as usize {
                    let src = row * bytes_per_row as usize;
                    let dst = row * padded_bytes_per_row as usize;
                    mapped[dst..dst + bytes_per_row as usize]
                        .copy_from_slice(&pixels.rgba[src..src + bytes_per_row as usize]);
                }
            }
        }
        staging.unmap();

        let size = wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("upload encoder"),
            });
        encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(pixels.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            size,
        );
        self.submit_and_wait(encoder, label)?;
        staging.destroy();

        cleanup.push(GpuResource::Texture(texture.clone()));
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(&self.device);
        Ok(Texture {
            texture,
            view,
            sampler,
        })
    }

    fn mapped_staging_buffer(&self, size: u64, label: &str) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} staging", label)),
            size,
            usage: wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        })
    }

    fn submit_and_wait(&self, encoder: wgpu::CommandEncoder, label: &str) -> Result<()> {
        let submission = self.queue.submit(iter::once(encoder.finish()));
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: Some(UPLOAD_TIMEOUT),
            })
            .map_err(|e| anyhow::anyhow!("{:?}", e))
            .with_context(|| format!("upload {:?} did not complete within {:?}", label, UPLOAD_TIMEOUT))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_the_next_multiple() {
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(255, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(0, 64), 0);
    }

    #[test]
    fn align_up_is_identity_for_aligned_sizes_and_zero_alignment() {
        assert_eq!(align_up(512, 256), 512);
        assert_eq!(align_up(123, 0), 123);
    }

    #[test]
    fn align_up_is_idempotent() {
        for size in [0u64, 1, 17, 255, 256, 1000] {
            for alignment in [0u64, 4, 64, 256] {
                let once = align_up(size, alignment);
                assert_eq!(align_up(once, alignment), once);
            }
        }
    }
}
