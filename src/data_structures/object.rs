//! The render-object table.
//!
//! A dense, append-only array of renderable entities. Handles are plain array
//! indices and stay valid for the lifetime of the engine: objects are added
//! during a session, never removed, so no deletion or compaction exists and
//! nothing ever invalidates a previously issued handle.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::mesh::MeshAsset;
use crate::pipelines::Material;

/// Stable handle to an entry in the [`RenderObjectTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub(crate) usize);

impl ObjectHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One renderable entity: mesh, material and world transform.
///
/// Freshly allocated objects carry an identity transform and no mesh or
/// material; the draw loop skips them until they are initialized.
#[derive(Debug, Clone)]
pub struct RenderObject {
    pub mesh: Option<Arc<MeshAsset>>,
    pub material: Option<Arc<Material>>,
    pub transform: Matrix4<f32>,
}

impl Default for RenderObject {
    fn default() -> Self {
        Self {
            mesh: None,
            material: None,
            transform: Matrix4::identity(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderObjectTable {
    objects: Vec<RenderObject>,
}

impl RenderObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a default-initialized object and return its handle together
    /// with a reference for immediate initialization.
    pub fn allocate(&mut self) -> (ObjectHandle, &mut RenderObject) {
        let handle = ObjectHandle(self.objects.len());
        self.objects.push(RenderObject::default());
        (handle, &mut self.objects[handle.0])
    }

    /// O(1) lookup. An out-of-range handle is a programmer error and panics.
    pub fn get(&self, handle: ObjectHandle) -> &RenderObject {
        &self.objects[handle.0]
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> &mut RenderObject {
        &mut self.objects[handle.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
