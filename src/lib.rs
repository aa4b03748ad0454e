//! Shoal
//!
//! A real-time 3D flocking (boids) simulation rendered with wgpu: a leader
//! chases waypoints through a bounded world while the flock follows, watched
//! by free or follow cameras, lit with shadow mapping and underwater
//! caustics.

pub mod app;
pub mod gfx;
pub mod sim;
pub mod ui;
pub mod wgpu_utils;

pub use app::ShoalApp;
pub use sim::{FlockConfig, FlockSimulation};

/// Creates a default application instance.
pub fn default() -> ShoalApp {
    pollster::block_on(ShoalApp::new())
}
