//! The background terrain-load task.
//!
//! A load runs as a detached tokio task owning no GPU state: grid layout,
//! batched elevation fetch, mesh and tint construction. The finished
//! [`TerrainBundle`] travels to the render thread through a one-shot channel;
//! errors are captured into the channel and reported on the next poll rather
//! than unwinding anywhere near the frame loop. There is no cancellation: a
//! started load runs to completion or failure.

use futures_intrusive::channel::shared::{OneshotReceiver, oneshot_channel};

use crate::data_structures::mesh::MeshData;
use crate::data_structures::texture::TexturePixels;
use crate::terrain::fetch::ElevationClient;
use crate::terrain::grid::{ElevationGrid, GeoBoundingBox, GeoPoint};
use crate::terrain::mesh::{build_mesh, build_tint_texture};

/// Parameters of one terrain load.
#[derive(Debug, Clone)]
pub struct TerrainRequest {
    pub bbox: GeoBoundingBox,
    pub points_per_axis: usize,
    /// Renderer-local origin; the telemetry track and the terrain must agree
    /// on it for the vehicle to fly over the right ground.
    pub origin: GeoPoint,
}

/// The finished product of a load: one mesh and its tint texture, both still
/// CPU-resident. Ownership transfers to the render thread with the bundle.
#[derive(Debug, Clone)]
pub struct TerrainBundle {
    pub mesh: MeshData,
    pub tint: TexturePixels,
}

/// Receiving end of the one-shot handoff, owned by the streaming integrator.
#[derive(Debug)]
pub struct TerrainTicket {
    pub(crate) receiver: OneshotReceiver<anyhow::Result<TerrainBundle>>,
}

#[derive(Debug, Clone, Default)]
pub struct AsyncTerrainLoader {
    client: ElevationClient,
}

impl AsyncTerrainLoader {
    pub fn new(client: ElevationClient) -> Self {
        Self { client }
    }

    /// Spawn one load on the given runtime and return its ticket.
    pub fn spawn(&self, handle: &tokio::runtime::Handle, request: TerrainRequest) -> TerrainTicket {
        let (sender, receiver) = oneshot_channel();
        let client = self.client.clone();
        handle.spawn(async move {
            let result = build_bundle(client, request).await;
            if sender.send(result).is_err() {
                log::warn!("terrain load finished but its receiver was dropped");
            }
        });
        TerrainTicket { receiver }
    }
}

async fn build_bundle(
    client: ElevationClient,
    request: TerrainRequest,
) -> anyhow::Result<TerrainBundle> {
    let mut grid = ElevationGrid::generate(request.bbox, request.points_per_axis)?;
    log::info!(
        "terrain load started: {} samples over {:?}",
        grid.sample_count(),
        request.bbox
    );
    client.fetch_elevations(&mut grid.cells).await;

    let mesh = build_mesh(&grid, &request.origin);
    let tint = build_tint_texture(&grid);
    log::info!(
        "terrain load finished: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(TerrainBundle { mesh, tint })
}
