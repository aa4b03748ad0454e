//! Free-flight and follow camera
//!
//! Four modes: a free WASD/mouse-look camera plus three scripted modes that
//! track the flock leader (trailing behind it, flying alongside it, or
//! watching from a fixed tower vantage). Follow distance grows with flock
//! size so larger flocks stay in frame.

use cgmath::*;

use crate::sim::traits::CameraFocus;

use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};

/// Remaps GL clip z in [-1, 1] to the [0, 1] range wgpu clips against.
/// `Matrix4::new` takes column-major order, so row 2 is (0, 0, 0.5, 0.5).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch stays short of the poles, same limit the boids use.
const PITCH_LIMIT_DEG: f32 = 89.0;

/// Base follow distance before the flock-size term.
const FOLLOW_BASE_DISTANCE: f32 = 200.0;
/// Per-agent distance factor; the behind view doubles it.
const FOLLOW_DISTANCE_FACTOR: f32 = 10.0;

const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// WASD movement with mouse look.
    Free,
    /// Trails the leader along its negative heading.
    Behind,
    /// Flies alongside the leader, offset along its lateral axis.
    Parallel,
    /// Fixed vantage that turns to track the leader.
    Tower,
}

#[derive(Debug, Clone, Copy)]
pub struct FlightCamera {
    pub mode: CameraMode,
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
    /// Vertical field of view; scroll zoom narrows it.
    pub fov: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Eye height is clamped to this band in every movable mode.
    pub min_height: f32,
    pub max_height: f32,
    /// Eye position used by [CameraMode::Tower].
    pub tower_eye: Vector3<f32>,
    pub uniform: CameraUniform,
}

impl Camera for FlightCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        let target = Point3::from_vec(self.position + self.front);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj = OPENGL_TO_WGPU_MATRIX
            * perspective(self.fov, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl FlightCamera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            mode: CameraMode::Free,
            position: vec3(0.0, 500.0, -800.0),
            front: Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: WORLD_UP,
            yaw: Deg(0.0),
            pitch: Deg(0.0),
            fov: Deg(90.0),
            aspect,
            znear: 1.0,
            zfar: 10000.0,
            min_height: 100.0,
            max_height: 1000.0,
            tower_eye: vec3(0.0, 650.0, 0.0),
            uniform: CameraUniform::default(),
        };
        camera.update_vectors();
        camera
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode != mode {
            log::info!("camera mode set to {:?}", mode);
        }
        self.mode = mode;
    }

    /// Distance kept from the leader, scaled by flock size.
    pub fn follow_distance(&self, flock_len: usize) -> f32 {
        let factor = if self.mode == CameraMode::Behind {
            FOLLOW_DISTANCE_FACTOR * 2.0
        } else {
            FOLLOW_DISTANCE_FACTOR
        };
        FOLLOW_BASE_DISTANCE + factor * (flock_len as f32).clamp(50.0, 75.0)
    }

    /// Repositions and orients the camera for the current follow mode.
    /// Free mode ignores the focus entirely.
    pub fn follow(&mut self, focus: &CameraFocus) {
        match self.mode {
            CameraMode::Free => return,
            CameraMode::Behind => {
                let distance = self.follow_distance(focus.flock_len);
                self.position = focus.position - focus.front * distance;
            }
            CameraMode::Parallel => {
                let distance = self.follow_distance(focus.flock_len);
                self.position = focus.position - focus.right * distance;
            }
            CameraMode::Tower => {
                self.position = self.tower_eye;
            }
        }
        self.position.y = self.position.y.clamp(self.min_height, self.max_height);
        self.look_at(focus.position);
    }

    /// Points the camera at a world position.
    pub fn look_at(&mut self, target: Vector3<f32>) {
        self.set_orientation(target - self.position);
    }

    /// Sets yaw and pitch from a direction vector, then rebuilds the basis.
    pub fn set_orientation(&mut self, direction: Vector3<f32>) {
        if direction.magnitude2() <= f32::EPSILON {
            return;
        }
        let dir = direction.normalize();
        let pitch = Deg::from(Rad((-dir.y).asin()));
        self.pitch = Deg(pitch.0.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG));
        self.yaw = Deg::from(Rad(dir.x.atan2(dir.z)));
        self.update_vectors();
    }

    pub fn add_yaw(&mut self, delta: Deg<f32>) {
        self.yaw += delta;
        self.update_vectors();
    }

    pub fn add_pitch(&mut self, delta: Deg<f32>) {
        self.pitch = Deg((self.pitch + delta).0.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG));
        self.update_vectors();
    }

    /// Scroll zoom: narrows or widens the field of view.
    pub fn add_zoom(&mut self, delta: f32) {
        self.fov = Deg((self.fov.0 - delta).clamp(1.0, 90.0));
    }

    /// Moves the eye, keeping it inside the world height band.
    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.position += offset;
        self.position.y = self.position.y.clamp(self.min_height, self.max_height);
    }

    fn update_vectors(&mut self) {
        let (sin_yaw, cos_yaw) = Rad::from(self.yaw).0.sin_cos();
        let (sin_pitch, cos_pitch) = Rad::from(self.pitch).0.sin_cos();

        // Matches the agents' convention: pitch = asin(-front.y),
        // yaw = atan2(front.x, front.z).
        self.front = vec3(cos_pitch * sin_yaw, -sin_pitch, cos_pitch * cos_yaw).normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position =
            [self.position.x, self.position.y, self.position.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus_at(position: Vector3<f32>, flock_len: usize) -> CameraFocus {
        CameraFocus {
            position,
            front: Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            flock_len,
        }
    }

    #[test]
    fn clip_correction_remaps_depth_to_unit_range() {
        // GL clip z covers [-w, w]; the corrected z must cover [0, w] with
        // w untouched.
        let near = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, -1.0, 1.0);
        let far = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!(near.z.abs() < 1e-6);
        assert!((near.w - 1.0).abs() < 1e-6);
        assert!((far.z - 1.0).abs() < 1e-6);
        assert!((far.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = FlightCamera::new(1.0);
        camera.add_zoom(500.0);
        assert_eq!(camera.fov, Deg(1.0));
        camera.add_zoom(-500.0);
        assert_eq!(camera.fov, Deg(90.0));
    }

    #[test]
    fn follow_distance_scales_with_flock_size_within_band() {
        let mut camera = FlightCamera::new(1.0);
        camera.set_mode(CameraMode::Parallel);

        // below and above the clamp band the distance saturates
        assert_eq!(camera.follow_distance(10), camera.follow_distance(50));
        assert_eq!(camera.follow_distance(75), camera.follow_distance(500));
        assert!(camera.follow_distance(60) > camera.follow_distance(50));
    }

    #[test]
    fn behind_mode_doubles_the_distance_factor() {
        let mut camera = FlightCamera::new(1.0);
        camera.set_mode(CameraMode::Parallel);
        let parallel = camera.follow_distance(60);
        camera.set_mode(CameraMode::Behind);
        let behind = camera.follow_distance(60);
        assert!((behind - parallel - FOLLOW_DISTANCE_FACTOR * 60.0).abs() < 1e-3);
    }

    #[test]
    fn behind_mode_trails_the_leader() {
        let mut camera = FlightCamera::new(1.0);
        camera.set_mode(CameraMode::Behind);
        let focus = focus_at(vec3(0.0, 500.0, 0.0), 60);
        camera.follow(&focus);

        // leader heads +z, so the camera sits at negative z looking +z
        assert!(camera.position.z < 0.0);
        assert!(camera.front.z > 0.99);
    }

    #[test]
    fn tower_mode_stays_put_and_tracks() {
        let mut camera = FlightCamera::new(1.0);
        camera.set_mode(CameraMode::Tower);
        let focus = focus_at(vec3(1000.0, 500.0, 0.0), 60);
        camera.follow(&focus);

        assert_eq!(camera.position, camera.tower_eye);
        assert!(camera.front.x > 0.5, "should look toward the leader");
    }

    #[test]
    fn free_mode_ignores_focus() {
        let mut camera = FlightCamera::new(1.0);
        let before = camera.position;
        camera.follow(&focus_at(vec3(500.0, 500.0, 500.0), 60));
        assert_eq!(camera.position, before);
    }

    #[test]
    fn eye_height_is_clamped_to_world_band() {
        let mut camera = FlightCamera::new(1.0);
        camera.translate(vec3(0.0, 10000.0, 0.0));
        assert_eq!(camera.position.y, camera.max_height);
        camera.translate(vec3(0.0, -10000.0, 0.0));
        assert_eq!(camera.position.y, camera.min_height);
    }

    #[test]
    fn orientation_round_trips_through_angles() {
        let mut camera = FlightCamera::new(1.0);
        let dir = vec3(1.0, -0.5, 0.5).normalize();
        camera.set_orientation(dir);
        assert!((camera.front - dir).magnitude() < 1e-4);
        assert!((camera.right.magnitude() - 1.0).abs() < 1e-5);
    }
}
