//! Simulation layer: the boid model, the flocking update, and the manager
//! that drives a [Simulation] from the app loop.

pub mod boid;
pub mod flock;
pub mod flock_sim;
pub mod manager;
pub mod traits;

pub use boid::Boid;
pub use flock::{Flock, FlockParams, Obstacle, WorldBounds};
pub use flock_sim::{FlockConfig, FlockSimulation};
pub use manager::SimulationManager;
pub use traits::{CameraFocus, Simulation};
