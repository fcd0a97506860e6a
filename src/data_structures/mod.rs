//! Engine data structures: meshes, textures and renderable objects.
//!
//! - `mesh` contains CPU-side mesh data and its uploaded GPU counterpart
//! - `texture` contains raw pixel buffers and the GPU texture wrapper
//! - `object` holds the append-only render-object table and its handles

pub mod mesh;
pub mod object;
pub mod texture;
