//! Graphics: cameras, procedural geometry, the wgpu renderer, GPU resources
//! and the scene graph.

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use rendering::RenderEngine;
pub use scene::Scene;
