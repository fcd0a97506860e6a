//! Asynchronous terrain streaming.
//!
//! A terrain load runs entirely off the render thread: `grid` lays out a
//! lat/lon sample grid over the telemetry bounding box, `fetch` fills in
//! elevations from a remote service in bounded batches, `mesh` turns the grid
//! into a height-field mesh with smooth normals plus a hypsometric tint
//! texture, and `loader` drives the whole thing as a detached task whose
//! result comes back through a one-shot channel.

pub mod fetch;
pub mod grid;
pub mod loader;
pub mod mesh;

pub use fetch::ElevationClient;
pub use grid::{ElevationGrid, GeoBoundingBox, GeoPoint, GridCell};
pub use loader::{AsyncTerrainLoader, TerrainBundle, TerrainRequest, TerrainTicket};
