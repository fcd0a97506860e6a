//! overflight
//!
//! Replays recorded flight telemetry as a moving vehicle above terrain that is
//! streamed in at runtime: a background task samples an elevation service over
//! HTTP, builds a textured height-field mesh and hands it to the render thread
//! through a one-shot channel, without ever blocking a frame. Rendering runs on
//! a double-buffered frame ring with explicit resource lifetimes and a
//! two-set binding model (per-frame globals + per-object transform array).
//!
//! High-level modules
//! - `app`: thin winit adapter driving the replay loop
//! - `camera`: camera types and projection for view/projection matrices
//! - `cleanup`: reverse-order teardown queue for GPU resources
//! - `context`: central GPU and window context that owns device/queue/surface
//! - `data_structures`: meshes, textures and the render-object table
//! - `frame`: frame ring buffer, scene/object uniforms and bind group layouts
//! - `pipelines`: render pipeline construction and shaders
//! - `playback`: replay clock and HUD readouts
//! - `renderer`: per-frame orchestration (wait, record, submit, present)
//! - `streaming`: non-blocking integration of finished terrain loads
//! - `terrain`: grid generation, elevation fetch and mesh construction
//!

pub mod app;
pub mod camera;
pub mod cleanup;
pub mod context;
pub mod data_structures;
pub mod exit;
pub mod frame;
pub mod pipelines;
pub mod playback;
pub mod registry;
pub mod renderer;
pub mod streaming;
pub mod telemetry;
pub mod terrain;
pub mod upload;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::event::WindowEvent;
