pub mod camera_controller;
pub mod camera_utils;
pub mod flight_camera;

pub use camera_controller::CameraController;
pub use camera_utils::{CameraManager, CameraUniform};
pub use flight_camera::{CameraMode, FlightCamera};
