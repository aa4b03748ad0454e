use cgmath::{Matrix4, SquareMatrix};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use crate::sim::traits::CameraFocus;

use super::{camera_controller::CameraController, flight_camera::FlightCamera};

pub struct CameraManager {
    pub camera: FlightCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: FlightCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.controller
            .process_events(event, window, &mut self.camera);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller
            .process_keyed_events(event, &mut self.camera);
    }

    /// Applies held movement keys. Only moves the camera in free mode.
    pub fn update(&mut self, dt: f32) {
        self.controller.apply_movement(dt, &mut self.camera);
    }

    /// Repositions the camera for the follow modes; no-op in free mode.
    pub fn follow(&mut self, focus: &CameraFocus) {
        self.camera.follow(focus);
    }

    pub fn get_view_proj_matrix(&self) -> Matrix4<f32> {
        self.camera.build_view_projection_matrix()
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

/// Camera data as the shaders see it.
///
/// The eye position is homogeneous to satisfy 16 byte alignment.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }
    result
}
