//! Reverse-order teardown queue for GPU resources.
//!
//! Every buffer and texture the engine creates is registered here at creation
//! time, and released through [`ResourceQueue::flush`] in exactly reverse
//! registration order once the GPU has been confirmed idle. Resources created
//! later may depend on earlier ones, so inverting creation order is the one
//! ordering that is always safe. No GPU resource is released on any other
//! path, with the single exception of upload staging buffers which are
//! destroyed as soon as their copy has completed.

/// A LIFO queue of pending teardown entries.
///
/// Generic over the entry type so the release order can be tested without a
/// GPU device; the engine uses it as [`ResourceQueue`].
#[derive(Debug, Default)]
pub struct ScopedQueue<T> {
    entries: Vec<T>,
}

impl<T> ScopedQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register one entry for teardown. Entries pushed later are released first.
    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release all entries in reverse push order, then clear the queue.
    ///
    /// Callers must not push from within `release`; the queue is drained
    /// before `flush` returns and re-entrant pushes are not supported.
    pub fn flush(&mut self, mut release: impl FnMut(T)) {
        while let Some(entry) = self.entries.pop() {
            release(entry);
        }
    }
}

/// A GPU resource awaiting teardown, tagged by kind.
///
/// wgpu handles are internally reference counted, so the queue holds plain
/// clones of the handles it will destroy.
#[derive(Debug)]
pub enum GpuResource {
    Buffer(wgpu::Buffer),
    Texture(wgpu::Texture),
}

pub type ResourceQueue = ScopedQueue<GpuResource>;

/// Destroy a single resource, dispatching on its kind.
///
/// Only called from [`ResourceQueue::flush`] after all in-flight frame
/// submissions have been waited on.
pub fn release(resource: GpuResource) {
    match resource {
        GpuResource::Buffer(buffer) => buffer.destroy(),
        GpuResource::Texture(texture) => texture.destroy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_runs_in_reverse_push_order() {
        let mut queue = ScopedQueue::new();
        queue.push("a");
        queue.push("b");
        queue.push("c");

        let mut released = Vec::new();
        queue.flush(|entry| released.push(entry));

        assert_eq!(released, vec!["c", "b", "a"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn flush_on_empty_queue_is_a_noop() {
        let mut queue: ScopedQueue<u32> = ScopedQueue::new();
        queue.flush(|_| panic!("nothing was pushed"));
        assert!(queue.is_empty());
    }

    #[test]
    fn queue_is_reusable_after_flush() {
        let mut queue = ScopedQueue::new();
        queue.push(1);
        queue.flush(|_| {});
        queue.push(2);
        queue.push(3);

        let mut released = Vec::new();
        queue.flush(|entry| released.push(entry));
        assert_eq!(released, vec![3, 2]);
    }
}
