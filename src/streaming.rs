//! Non-blocking integration of finished terrain loads.
//!
//! The integrator owns at most one outstanding [`TerrainTicket`] and is
//! polled once per frame on the render thread. A poll never waits: it checks
//! the one-shot channel and returns immediately, so an incomplete load costs
//! O(1) per frame. Starting a load while another is outstanding is rejected
//! with a warning rather than silently discarding the pending task's work.

use futures::FutureExt as _;

use crate::terrain::{AsyncTerrainLoader, TerrainBundle, TerrainRequest, TerrainTicket};

/// Outcome of one per-frame poll. `Ready` and `Failed` are delivered exactly
/// once; afterwards the integrator is `Idle` until a new load is started.
#[derive(Debug)]
pub enum TerrainPoll {
    /// No load outstanding.
    Idle,
    /// A load is running; nothing to do this frame.
    Pending,
    /// The load finished; the bundle is handed over exactly once.
    Ready(TerrainBundle),
    /// The load failed; the scene stays untouched.
    Failed(anyhow::Error),
}

#[derive(Debug, Default)]
pub struct StreamingIntegrator {
    loader: AsyncTerrainLoader,
    pending: Option<TerrainTicket>,
}

impl StreamingIntegrator {
    pub fn new(loader: AsyncTerrainLoader) -> Self {
        Self {
            loader,
            pending: None,
        }
    }

    /// Start a terrain load. Returns false (and leaves the running load
    /// untouched) if one is already outstanding.
    pub fn begin_load(&mut self, handle: &tokio::runtime::Handle, request: TerrainRequest) -> bool {
        if self.pending.is_some() {
            log::warn!("terrain load requested while another is outstanding, rejecting");
            return false;
        }
        self.pending = Some(self.loader.spawn(handle, request));
        true
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Check the outstanding load without blocking.
    pub fn poll(&mut self) -> TerrainPoll {
        let Some(ticket) = &self.pending else {
            return TerrainPoll::Idle;
        };
        // A one-shot receive future resolves immediately or not at all right
        // now; now_or_never polls it exactly once.
        match ticket.receiver.receive().now_or_never() {
            None => TerrainPoll::Pending,
            Some(Some(Ok(bundle))) => {
                self.pending = None;
                TerrainPoll::Ready(bundle)
            }
            Some(Some(Err(e))) => {
                self.pending = None;
                TerrainPoll::Failed(e)
            }
            Some(None) => {
                self.pending = None;
                TerrainPoll::Failed(anyhow::anyhow!(
                    "terrain load task dropped its channel without a result"
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::mesh::MeshData;
    use crate::data_structures::texture::TexturePixels;
    use futures_intrusive::channel::shared::oneshot_channel;

    fn pending_ticket() -> (
        futures_intrusive::channel::shared::OneshotSender<anyhow::Result<TerrainBundle>>,
        TerrainTicket,
    ) {
        let (sender, receiver) = oneshot_channel();
        (sender, TerrainTicket { receiver })
    }

    fn empty_bundle() -> TerrainBundle {
        TerrainBundle {
            mesh: MeshData::default(),
            tint: TexturePixels {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            },
        }
    }

    #[test]
    fn poll_with_no_load_outstanding_is_idle() {
        let mut integrator = StreamingIntegrator::default();
        assert!(matches!(integrator.poll(), TerrainPoll::Idle));
        assert!(!integrator.is_loading());
    }

    #[test]
    fn poll_of_an_incomplete_load_returns_pending_without_blocking() {
        let (_sender, ticket) = pending_ticket();
        let mut integrator = StreamingIntegrator::default();
        integrator.pending = Some(ticket);

        for _ in 0..3 {
            assert!(matches!(integrator.poll(), TerrainPoll::Pending));
        }
        assert!(integrator.is_loading());
    }

    #[test]
    fn a_finished_load_is_delivered_exactly_once() {
        let (sender, ticket) = pending_ticket();
        let mut integrator = StreamingIntegrator::default();
        integrator.pending = Some(ticket);

        sender.send(Ok(empty_bundle())).ok().unwrap();
        assert!(matches!(integrator.poll(), TerrainPoll::Ready(_)));
        // Consumed: subsequent polls report no update.
        assert!(matches!(integrator.poll(), TerrainPoll::Idle));
    }

    #[test]
    fn a_failed_load_is_reported_once_and_consumed() {
        let (sender, ticket) = pending_ticket();
        let mut integrator = StreamingIntegrator::default();
        integrator.pending = Some(ticket);

        sender.send(Err(anyhow::anyhow!("boom"))).ok().unwrap();
        assert!(matches!(integrator.poll(), TerrainPoll::Failed(_)));
        assert!(matches!(integrator.poll(), TerrainPoll::Idle));
    }

    #[test]
    fn a_second_load_is_rejected_while_one_is_outstanding() {
        use crate::terrain::{GeoBoundingBox, GeoPoint};

        let (_sender, ticket) = pending_ticket();
        let mut integrator = StreamingIntegrator::default();
        integrator.pending = Some(ticket);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let request = TerrainRequest {
            bbox: GeoBoundingBox {
                ll_lat: 0.0,
                ll_lon: 0.0,
                ur_lat: 1.0,
                ur_lon: 1.0,
            },
            points_per_axis: 2,
            origin: GeoPoint::default(),
        };
        assert!(!integrator.begin_load(runtime.handle(), request));
        // The original load is still the outstanding one.
        assert!(matches!(integrator.poll(), TerrainPoll::Pending));
    }

    #[test]
    fn a_dropped_task_surfaces_as_failure() {
        let (sender, ticket) = pending_ticket();
        let mut integrator = StreamingIntegrator::default();
        integrator.pending = Some(ticket);

        drop(sender);
        assert!(matches!(integrator.poll(), TerrainPoll::Failed(_)));
        assert!(matches!(integrator.poll(), TerrainPoll::Idle));
    }
}
