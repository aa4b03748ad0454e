//! Core simulation trait: the interface a simulation implements to be driven
//! by the app loop and to expose its controls to the UI overlay.

use cgmath::Vector3;
use imgui::Ui;

use crate::gfx::scene::Scene;

/// Pose the camera follow modes track, published by the simulation each
/// frame (the leader boid in the flocking demo).
#[derive(Debug, Clone, Copy)]
pub struct CameraFocus {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    /// Number of agents in the flock; follow distance scales with it.
    pub flock_len: usize,
}

/// Lifecycle of a user simulation inside the engine loop.
pub trait Simulation {
    /// Called once when the simulation is attached. Spawn scene objects and
    /// set up initial state here.
    fn initialize(&mut self, scene: &mut Scene);

    /// Advances the simulation by one time step and writes the results back
    /// into scene object transforms.
    fn update(&mut self, delta_time: f32, scene: &mut Scene);

    /// Draws the simulation's own control panel.
    fn render_ui(&mut self, ui: &Ui);

    fn name(&self) -> &str;

    fn is_running(&self) -> bool;

    fn set_running(&mut self, running: bool);

    /// Restores the initial state.
    fn reset(&mut self, scene: &mut Scene);

    /// Target for camera follow modes, if the simulation has one.
    fn camera_focus(&self) -> Option<CameraFocus> {
        None
    }
}
