//! A single flock member: velocity-driven motion with an orientation basis
//! derived from the direction of travel.

use cgmath::{Deg, InnerSpace, Vector3, Zero};

/// Pitch is clamped short of the poles so the yaw derivation stays stable.
pub const PITCH_LIMIT_DEG: f32 = 89.0;

/// World up used when deriving the lateral axis.
pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// An autonomous agent. The orientation basis (`front`, `right`, `up`) always
/// follows the velocity, never the other way around.
#[derive(Debug, Clone)]
pub struct Boid {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub front: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    pub pitch: Deg<f32>,
    pub yaw: Deg<f32>,
}

impl Boid {
    /// Creates a boid at `position` heading along `front`.
    pub fn new(position: Vector3<f32>, front: Vector3<f32>) -> Self {
        let mut boid = Self {
            position,
            // A tiny nonzero velocity keeps the first orientation update sane.
            velocity: front * 0.001,
            front: Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: WORLD_UP,
            pitch: Deg(0.0),
            yaw: Deg(0.0),
        };
        boid.set_heading(front);
        boid
    }

    /// Advances the position by `velocity * dt` and re-derives the
    /// orientation from the actual displacement. When the displacement is
    /// near zero the previous heading is kept; normalizing it would divide
    /// by zero.
    pub fn integrate(&mut self, dt: f32) {
        let old_position = self.position;
        self.position += self.velocity * dt;

        let travelled = self.position - old_position;
        if travelled.magnitude2() > f32::EPSILON {
            self.set_heading(travelled);
        }
    }

    /// Points the boid along `direction` (not required to be normalized) and
    /// recomputes pitch, yaw and the lateral axis.
    pub fn set_heading(&mut self, direction: Vector3<f32>) {
        if direction.magnitude2() <= f32::EPSILON {
            return;
        }
        self.front = direction.normalize();

        let pitch = Deg::from(cgmath::Rad((-self.front.y).asin()));
        self.pitch = Deg(pitch.0.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG));
        self.yaw = Deg::from(cgmath::Rad(self.front.x.atan2(self.front.z)));

        let lateral = self.front.cross(WORLD_UP);
        if lateral.magnitude2() > f32::EPSILON {
            self.right = lateral.normalize();
            self.up = self.right.cross(self.front).normalize();
        }
    }

    /// Clamps each velocity component to `±max_speed`.
    pub fn limit_speed(&mut self, max_speed: f32) {
        self.velocity.x = self.velocity.x.clamp(-max_speed, max_speed);
        self.velocity.y = self.velocity.y.clamp(-max_speed, max_speed);
        self.velocity.z = self.velocity.z.clamp(-max_speed, max_speed);
    }

    /// Speed along the current velocity vector.
    pub fn speed(&self) -> f32 {
        if self.velocity.is_zero() {
            0.0
        } else {
            self.velocity.magnitude()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    #[test]
    fn heading_follows_displacement() {
        let mut boid = Boid::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0));
        boid.velocity = vec3(10.0, 0.0, 0.0);
        boid.integrate(1.0);

        assert!((boid.position.x - 10.0).abs() < 1e-5);
        assert!((boid.front - vec3(1.0, 0.0, 0.0)).magnitude() < 1e-5);
        assert!((boid.yaw.0 - 90.0).abs() < 1e-3);
    }

    #[test]
    fn zero_displacement_keeps_previous_heading() {
        let mut boid = Boid::new(vec3(1.0, 2.0, 3.0), vec3(0.0, 0.0, -1.0));
        let front_before = boid.front;
        boid.velocity = Vector3::zero();
        boid.integrate(0.016);

        assert_eq!(boid.front, front_before);
        assert_eq!(boid.position, vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn pitch_is_clamped_near_vertical() {
        let mut boid = Boid::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0));
        boid.set_heading(vec3(0.0, -1.0, 0.001));
        assert!(boid.pitch.0 <= PITCH_LIMIT_DEG);
        assert!(boid.pitch.0 >= 80.0);
    }

    #[test]
    fn limit_speed_clamps_componentwise() {
        let mut boid = Boid::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0));
        boid.velocity = vec3(500.0, -500.0, 100.0);
        boid.limit_speed(220.0);
        assert_eq!(boid.velocity, vec3(220.0, -220.0, 100.0));
    }

    #[test]
    fn orientation_basis_stays_normalized() {
        let mut boid = Boid::new(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.4, -0.3));
        boid.set_heading(vec3(-2.0, 1.0, 4.0));
        assert!((boid.front.magnitude() - 1.0).abs() < 1e-5);
        assert!((boid.right.magnitude() - 1.0).abs() < 1e-5);
        assert!((boid.up.magnitude() - 1.0).abs() < 1e-5);
        assert!(boid.front.dot(boid.right).abs() < 1e-4);
    }
}
