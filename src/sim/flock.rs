//! The flocking update: per-agent velocity integration driven by four
//! weighted behavioral forces, boundary containment, and orientation derived
//! from velocity. Neighbor influence is O(n²) over the flock; there is no
//! spatial index and none is needed at the flock sizes this targets.

use cgmath::{vec3, InnerSpace, Vector3, Zero};
use rand::Rng;

use super::boid::Boid;

/// Axis-aligned world volume the flock is contained in: `±ground_extent`
/// horizontally, `[min_height, max_height]` vertically.
#[derive(Debug, Clone, Copy)]
pub struct WorldBounds {
    pub ground_extent: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            ground_extent: 2000.0,
            min_height: 100.0,
            max_height: 1000.0,
        }
    }
}

impl WorldBounds {
    pub fn contains(&self, p: Vector3<f32>) -> bool {
        p.x.abs() <= self.ground_extent
            && p.z.abs() <= self.ground_extent
            && p.y >= self.min_height
            && p.y <= self.max_height
    }

    pub fn clamp_height(&self, y: f32) -> f32 {
        y.clamp(self.min_height, self.max_height)
    }

    /// Uniformly sampled point inside the volume, away from the walls.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vector3<f32> {
        let margin = self.ground_extent * 0.1;
        let extent = self.ground_extent - margin;
        vec3(
            rng.random_range(-extent..extent),
            rng.random_range(self.min_height..self.max_height),
            rng.random_range(-extent..extent),
        )
    }
}

/// A static obstacle the flock steers wide of (the tower in the demo scene).
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub position: Vector3<f32>,
    pub radius: f32,
    pub height: f32,
}

impl Obstacle {
    pub fn new(position: Vector3<f32>, radius: f32, height: f32) -> Self {
        Self {
            position,
            radius,
            height,
        }
    }
}

/// Tunable steering parameters. The divisors come from the reference
/// behavior: each force is a raw positional/velocity delta scaled down by a
/// fixed factor rather than a normalized steering vector.
#[derive(Debug, Clone, Copy)]
pub struct FlockParams {
    pub separation: bool,
    pub cohesion: bool,
    pub alignment: bool,
    pub goal: bool,

    /// Componentwise speed limit.
    pub max_speed: f32,
    /// Inward velocity applied when a boid crosses a world boundary.
    pub containment_push: f32,
    /// Distance under which another flock member repels.
    pub neighbor_avoid_radius: f32,
    /// Distance under which the obstacle repels.
    pub obstacle_avoid_radius: f32,

    pub separation_falloff: f32,
    pub cohesion_divisor: f32,
    pub alignment_divisor: f32,
    /// Divisor for seeking an explicit point (used by the leader).
    pub seek_divisor: f32,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            separation: true,
            cohesion: true,
            alignment: true,
            goal: true,
            max_speed: 220.0,
            containment_push: 10.0,
            neighbor_avoid_radius: 30.0,
            obstacle_avoid_radius: 400.0,
            separation_falloff: 10.0,
            cohesion_divisor: 100.0,
            alignment_divisor: 8.0,
            seek_divisor: 50.0,
        }
    }
}

/// How close the leader has to get to its waypoint before picking a new one.
const WAYPOINT_ARRIVAL_RADIUS: f32 = 150.0;

/// A flock of boids plus the distinguished leader they treat as an
/// attraction target. The leader ignores the flock and instead seeks a
/// scripted waypoint, re-rolled on arrival.
pub struct Flock {
    pub boids: Vec<Boid>,
    pub leader: Boid,
    pub obstacle: Obstacle,
    pub bounds: WorldBounds,
    pub params: FlockParams,
    waypoint: Vector3<f32>,
}

impl Flock {
    /// Spawns `count` boids jittered around the world center, all heading
    /// roughly the same way so the flock coheres quickly.
    pub fn new(count: usize, bounds: WorldBounds, obstacle: Obstacle, params: FlockParams) -> Self {
        let mut rng = rand::rng();
        let mid_height = (bounds.min_height + bounds.max_height) * 0.5;
        let spread = bounds.ground_extent * 0.1;

        let boids = (0..count)
            .map(|_| {
                let position = vec3(
                    rng.random_range(-spread..spread),
                    mid_height + rng.random_range(-spread * 0.25..spread * 0.25),
                    rng.random_range(-spread..spread),
                );
                let front = vec3(
                    rng.random_range(-0.2..0.2),
                    rng.random_range(-0.1..0.1),
                    1.0,
                );
                Boid::new(position, front)
            })
            .collect();

        let leader = Boid::new(vec3(0.0, mid_height, spread * 2.0), Vector3::unit_z());
        let waypoint = bounds.random_point(&mut rng);

        Self {
            boids,
            leader,
            obstacle,
            bounds,
            params,
            waypoint,
        }
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn waypoint(&self) -> Vector3<f32> {
        self.waypoint
    }

    /// Advances the whole flock by `dt` seconds. Forces are computed against
    /// the pre-update state of the flock, then every member integrates.
    pub fn update(&mut self, dt: f32) {
        self.update_leader(dt);

        let forces: Vec<Vector3<f32>> = (0..self.boids.len())
            .map(|i| self.steering(i))
            .collect();

        let params = self.params;
        let bounds = self.bounds;
        for (boid, force) in self.boids.iter_mut().zip(forces) {
            boid.velocity += force;
            contain(boid, &bounds, params.containment_push);
            boid.limit_speed(params.max_speed);
            boid.integrate(dt);
        }
    }

    /// Sum of the four behavioral forces for boid `i`.
    fn steering(&self, i: usize) -> Vector3<f32> {
        let p = &self.params;
        let mut force = Vector3::zero();
        if p.separation {
            force += self.separation(i);
        }
        if p.cohesion {
            force += self.cohesion(i);
        }
        if p.alignment {
            force += self.alignment(i);
        }
        if p.goal {
            force += self.goal(i);
        }
        force
    }

    /// Repulsion from every flock member (leader included) inside the
    /// avoidance radius, plus a wide berth around the obstacle.
    fn separation(&self, i: usize) -> Vector3<f32> {
        let boid = &self.boids[i];
        let p = &self.params;
        let mut force = Vector3::zero();

        for (j, other) in self.boids.iter().enumerate() {
            if j == i {
                continue;
            }
            let offset = other.position - boid.position;
            if offset.magnitude() < p.neighbor_avoid_radius {
                force -= offset / p.separation_falloff;
            }
        }

        let leader_offset = self.leader.position - boid.position;
        if leader_offset.magnitude() < p.neighbor_avoid_radius {
            force -= leader_offset / p.separation_falloff;
        }

        let obstacle_offset = self.obstacle.position - boid.position;
        if obstacle_offset.magnitude() < p.obstacle_avoid_radius {
            force -= obstacle_offset / p.separation_falloff;
        }

        force
    }

    /// Pull toward the centroid of the other flock members.
    fn cohesion(&self, i: usize) -> Vector3<f32> {
        if self.boids.len() < 2 {
            return Vector3::zero();
        }
        let boid = &self.boids[i];
        let mut centroid = Vector3::zero();
        for (j, other) in self.boids.iter().enumerate() {
            if j != i {
                centroid += other.position;
            }
        }
        centroid /= (self.boids.len() - 1) as f32;
        (centroid - boid.position) / self.params.cohesion_divisor
    }

    /// Pull toward the mean velocity of the other flock members.
    fn alignment(&self, i: usize) -> Vector3<f32> {
        if self.boids.len() < 2 {
            return Vector3::zero();
        }
        let boid = &self.boids[i];
        let mut mean = Vector3::zero();
        for (j, other) in self.boids.iter().enumerate() {
            if j != i {
                mean += other.velocity;
            }
        }
        mean /= (self.boids.len() - 1) as f32;
        (mean - boid.velocity) / self.params.alignment_divisor
    }

    /// Attraction toward the leader, diluted by flock size so large flocks
    /// do not collapse onto it.
    fn goal(&self, i: usize) -> Vector3<f32> {
        let boid = &self.boids[i];
        (self.leader.position - boid.position) / self.boids.len().max(1) as f32
    }

    /// The leader seeks its current waypoint; on arrival a fresh one is
    /// rolled inside the world volume.
    fn update_leader(&mut self, dt: f32) {
        if (self.waypoint - self.leader.position).magnitude() < WAYPOINT_ARRIVAL_RADIUS {
            let mut rng = rand::rng();
            self.waypoint = self.bounds.random_point(&mut rng);
            log::debug!(
                "leader reached waypoint, next target ({:.0}, {:.0}, {:.0})",
                self.waypoint.x,
                self.waypoint.y,
                self.waypoint.z
            );
        }

        self.leader.velocity += (self.waypoint - self.leader.position) / self.params.seek_divisor;
        contain(&mut self.leader, &self.bounds, self.params.containment_push);
        self.leader.limit_speed(self.params.max_speed);
        self.leader.integrate(dt);
    }

    /// Grows or shrinks the flock in place, keeping existing members.
    pub fn resize(&mut self, count: usize) {
        let mut rng = rand::rng();
        while self.boids.len() < count {
            let position = self.leader.position
                + vec3(
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-100.0..100.0),
                );
            self.boids.push(Boid::new(position, self.leader.front));
        }
        self.boids.truncate(count);
    }
}

/// Boundary containment: each position component that has left the world
/// volume gets its velocity component replaced with a fixed inward push.
fn contain(boid: &mut Boid, bounds: &WorldBounds, push: f32) {
    if boid.position.x < -bounds.ground_extent {
        boid.velocity.x = push;
    } else if boid.position.x > bounds.ground_extent {
        boid.velocity.x = -push;
    }

    if boid.position.y < bounds.min_height {
        boid.velocity.y = push;
    } else if boid.position.y > bounds.max_height {
        boid.velocity.y = -push;
    }

    if boid.position.z < -bounds.ground_extent {
        boid.velocity.z = push;
    } else if boid.position.z > bounds.ground_extent {
        boid.velocity.z = -push;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    fn test_flock(count: usize) -> Flock {
        Flock::new(
            count,
            WorldBounds::default(),
            Obstacle::new(vec3(0.0, 0.0, 0.0), 50.0, 600.0),
            FlockParams::default(),
        )
    }

    #[test]
    fn cohesion_pulls_toward_centroid() {
        let mut flock = test_flock(3);
        flock.boids[0].position = vec3(0.0, 500.0, 0.0);
        flock.boids[1].position = vec3(1000.0, 500.0, 0.0);
        flock.boids[2].position = vec3(1000.0, 500.0, 100.0);

        let force = flock.cohesion(0);
        assert!(force.x > 0.0, "expected pull toward +x centroid");
    }

    #[test]
    fn separation_pushes_apart() {
        let mut flock = test_flock(2);
        flock.boids[0].position = vec3(0.0, 500.0, 0.0);
        flock.boids[1].position = vec3(5.0, 500.0, 0.0);
        // Park the leader and obstacle far away so only the neighbor acts.
        flock.leader.position = vec3(0.0, 900.0, 1900.0);
        flock.obstacle.position = vec3(1900.0, 100.0, -1900.0);

        let force = flock.separation(0);
        assert!(force.x < 0.0, "expected push away from near neighbor");
    }

    #[test]
    fn obstacle_repels_at_long_range() {
        let mut flock = test_flock(1);
        flock.boids[0].position = vec3(0.0, 500.0, 0.0);
        flock.leader.position = vec3(0.0, 900.0, 1900.0);
        flock.obstacle.position = vec3(300.0, 500.0, 0.0);

        let force = flock.separation(0);
        assert!(force.x < 0.0, "expected push away from obstacle");
    }

    #[test]
    fn alignment_matches_neighbor_velocity() {
        let mut flock = test_flock(2);
        flock.boids[0].velocity = vec3(0.0, 0.0, 0.0);
        flock.boids[1].velocity = vec3(80.0, 0.0, 0.0);

        let force = flock.alignment(0);
        assert!((force.x - 10.0).abs() < 1e-4); // (80 - 0) / 8
    }

    #[test]
    fn goal_force_dilutes_with_flock_size() {
        let mut small = test_flock(2);
        let mut large = test_flock(20);
        for flock in [&mut small, &mut large] {
            flock.leader.position = vec3(100.0, 500.0, 0.0);
            flock.boids[0].position = vec3(0.0, 500.0, 0.0);
        }

        let f_small = small.goal(0);
        let f_large = large.goal(0);
        assert!(f_small.x > f_large.x);
        assert!((f_small.x - 50.0).abs() < 1e-4); // 100 / 2
    }

    #[test]
    fn containment_replaces_velocity_component() {
        let bounds = WorldBounds::default();
        let mut boid = Boid::new(
            vec3(bounds.ground_extent + 1.0, 500.0, 0.0),
            vec3(1.0, 0.0, 0.0),
        );
        boid.velocity = vec3(200.0, 0.0, 30.0);
        contain(&mut boid, &bounds, 10.0);

        assert_eq!(boid.velocity.x, -10.0);
        assert_eq!(boid.velocity.z, 30.0);
    }

    #[test]
    fn speed_stays_clamped_after_update() {
        let mut flock = test_flock(8);
        for _ in 0..200 {
            flock.update(1.0 / 60.0);
        }
        let max = flock.params.max_speed;
        for boid in &flock.boids {
            assert!(boid.velocity.x.abs() <= max);
            assert!(boid.velocity.y.abs() <= max);
            assert!(boid.velocity.z.abs() <= max);
        }
    }

    #[test]
    fn flock_returns_inside_bounds() {
        let mut flock = test_flock(4);
        // Just past the wall: the containment push is a fixed 10 units/s, so
        // 600 frames recover ~100 units but no more.
        flock.boids[0].position = vec3(flock.bounds.ground_extent + 20.0, 500.0, 0.0);
        flock.boids[0].velocity = vec3(220.0, 0.0, 0.0);

        for _ in 0..600 {
            flock.update(1.0 / 60.0);
        }
        // Containment only overwrites the outward component, so allow one
        // frame of overshoot past the wall.
        let slack = flock.params.max_speed / 60.0;
        for boid in &flock.boids {
            assert!(boid.position.x.abs() <= flock.bounds.ground_extent + slack);
            assert!(boid.position.z.abs() <= flock.bounds.ground_extent + slack);
        }
    }

    #[test]
    fn disabled_forces_contribute_nothing() {
        let mut flock = test_flock(5);
        flock.params.separation = false;
        flock.params.cohesion = false;
        flock.params.alignment = false;
        flock.params.goal = false;

        for i in 0..flock.len() {
            assert_eq!(flock.steering(i), Vector3::zero());
        }
    }

    #[test]
    fn leader_seeks_waypoint() {
        let mut flock = test_flock(2);
        let before = (flock.waypoint() - flock.leader.position).magnitude();
        for _ in 0..30 {
            flock.update(1.0 / 60.0);
        }
        // Either it got closer or it arrived and re-rolled the waypoint.
        let after = (flock.waypoint() - flock.leader.position).magnitude();
        assert!(after < before || before < WAYPOINT_ARRIVAL_RADIUS * 2.0);
    }

    #[test]
    fn resize_preserves_existing_members() {
        let mut flock = test_flock(4);
        let first_pos = flock.boids[0].position;
        flock.resize(10);
        assert_eq!(flock.len(), 10);
        assert_eq!(flock.boids[0].position, first_pos);
        flock.resize(3);
        assert_eq!(flock.len(), 3);
    }

    #[test]
    fn bounds_random_point_is_inside() {
        let bounds = WorldBounds::default();
        let mut rng = rand::rng();
        for _ in 0..100 {
            assert!(bounds.contains(bounds.random_point(&mut rng)));
        }
    }
}
