//! Mesh data, on the CPU and on the GPU.
//!
//! [`MeshData`] is plain vertex/index arrays as produced by the terrain
//! builder or handed over by an external model loader. It stays immutable once
//! built; uploading it through the upload pipeline yields a [`MeshAsset`]
//! whose GPU buffers exist exactly because the upload completed. A mesh is
//! never patched in place, only replaced wholesale.

/// Vertex layout description for pipeline construction.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// The vertex format shared by the terrain and the vehicle model.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU-resident mesh: vertex and index arrays ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Build mesh data from the opaque arrays an external model loader
    /// provides. `normals` and `tex_coords` may be shorter than `positions`;
    /// missing entries fall back to zero like in a partially exported file.
    pub fn from_raw_arrays(
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        tex_coords: &[[f32; 2]],
        indices: &[u32],
    ) -> Self {
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, position)| MeshVertex {
                position: *position,
                normal: normals.get(i).copied().unwrap_or([0.0; 3]),
                tex_coords: tex_coords.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect();
        Self {
            vertices,
            indices: indices.to_vec(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// GPU-resident mesh. Exists iff its upload completed.
#[derive(Debug)]
pub struct MeshAsset {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_arrays_pad_missing_attributes_with_zero() {
        let data = MeshData::from_raw_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0.0, 1.0, 0.0]],
            &[],
            &[0, 1, 2],
        );
        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.triangle_count(), 1);
        assert_eq!(data.vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(data.vertices[1].normal, [0.0; 3]);
        assert_eq!(data.vertices[2].tex_coords, [0.0; 2]);
    }
}
