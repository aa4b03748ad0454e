//! Flocking simulation wired into the scene
//!
//! Owns a [Flock] and a pool of scene objects, one per potential flock
//! member. The pool is spawned up front at the maximum flock size and members
//! beyond the current count are hidden, so resizing the flock from the UI
//! never needs new GPU resources mid-run.

use cgmath::vec3;
use imgui::Ui;

use crate::gfx::{geometry, scene::Scene};

use super::flock::{Flock, FlockParams, Obstacle, WorldBounds};
use super::traits::{CameraFocus, Simulation};

#[derive(Debug, Clone)]
pub struct FlockConfig {
    /// Initial flock size.
    pub count: usize,
    /// Upper bound for the UI slider; the object pool is this large.
    pub max_count: usize,
    pub boid_scale: f32,
    pub leader_scale: f32,
    pub boid_material: String,
    pub leader_material: String,
    pub bounds: WorldBounds,
    pub obstacle: Obstacle,
    pub params: FlockParams,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            count: 60,
            max_count: 200,
            boid_scale: 8.0,
            leader_scale: 12.0,
            boid_material: "boid".to_string(),
            leader_material: "leader".to_string(),
            bounds: WorldBounds::default(),
            obstacle: Obstacle::new(vec3(0.0, 0.0, 0.0), 50.0, 600.0),
            params: FlockParams::default(),
        }
    }
}

pub struct FlockSimulation {
    flock: Flock,
    config: FlockConfig,
    /// Flock size requested by the UI, applied at the start of the next step.
    pending_count: usize,
    running: bool,

    /// Model index shared by all flock members; filled in `initialize` unless
    /// set up front via [`with_model`](Self::with_model).
    model: Option<usize>,
    boid_objects: Vec<usize>,
    leader_object: Option<usize>,
}

impl FlockSimulation {
    pub fn new(config: FlockConfig) -> Self {
        let count = config.count.min(config.max_count);
        let flock = Flock::new(count, config.bounds, config.obstacle, config.params);
        Self {
            flock,
            pending_count: count,
            config,
            running: true,
            model: None,
            boid_objects: Vec::new(),
            leader_object: None,
        }
    }

    /// Uses an already-registered model (a loaded OBJ) instead of the
    /// built-in fish.
    pub fn with_model(mut self, model: usize) -> Self {
        self.model = Some(model);
        self
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    /// Writes every member's pose into its scene object.
    fn sync_transforms(&self, scene: &mut Scene) {
        for (boid, &object_index) in self.flock.boids.iter().zip(&self.boid_objects) {
            if let Some(object) = scene.get_object_mut(object_index) {
                object.set_transform_oriented(
                    boid.position,
                    boid.yaw,
                    boid.pitch,
                    self.config.boid_scale,
                );
            }
        }

        if let Some(leader_index) = self.leader_object {
            if let Some(object) = scene.get_object_mut(leader_index) {
                let leader = &self.flock.leader;
                object.set_transform_oriented(
                    leader.position,
                    leader.yaw,
                    leader.pitch,
                    self.config.leader_scale,
                );
            }
        }
    }

    /// Hides pool members beyond the current flock size.
    fn sync_visibility(&self, scene: &mut Scene) {
        for (i, &object_index) in self.boid_objects.iter().enumerate() {
            if let Some(object) = scene.get_object_mut(object_index) {
                object.visible = i < self.flock.len();
            }
        }
    }
}

impl Simulation for FlockSimulation {
    fn initialize(&mut self, scene: &mut Scene) {
        let model = self
            .model
            .unwrap_or_else(|| scene.add_model(geometry::fish_model()));
        self.model = Some(model);

        self.boid_objects = (0..self.config.max_count)
            .map(|i| {
                let index = scene.spawn(model, &format!("boid_{i}"));
                if let Some(object) = scene.get_object_mut(index) {
                    object.set_material(&self.config.boid_material);
                }
                index
            })
            .collect();

        let leader_index = scene.spawn(model, "leader");
        if let Some(object) = scene.get_object_mut(leader_index) {
            object.set_material(&self.config.leader_material);
        }
        self.leader_object = Some(leader_index);

        self.sync_visibility(scene);
        self.sync_transforms(scene);

        log::info!(
            "flock initialized: {} of {} pool members active",
            self.flock.len(),
            self.config.max_count
        );
    }

    fn update(&mut self, delta_time: f32, scene: &mut Scene) {
        if self.pending_count != self.flock.len() {
            self.flock.resize(self.pending_count);
            self.sync_visibility(scene);
        }

        self.flock.update(delta_time);
        self.sync_transforms(scene);
    }

    fn render_ui(&mut self, ui: &Ui) {
        ui.window("Flock")
            .size([320.0, 340.0], imgui::Condition::FirstUseEver)
            .build(|| {
                let params = &mut self.flock.params;
                ui.checkbox("Separation", &mut params.separation);
                ui.checkbox("Cohesion", &mut params.cohesion);
                ui.checkbox("Alignment", &mut params.alignment);
                ui.checkbox("Follow leader", &mut params.goal);

                ui.slider("Max speed", 50.0, 400.0, &mut params.max_speed);
                ui.slider("Separation falloff", 1.0, 40.0, &mut params.separation_falloff);
                ui.slider("Cohesion divisor", 20.0, 400.0, &mut params.cohesion_divisor);
                ui.slider("Alignment divisor", 1.0, 40.0, &mut params.alignment_divisor);

                let mut count = self.pending_count as i32;
                if ui.slider("Flock size", 1, self.config.max_count as i32, &mut count) {
                    self.pending_count = count.max(1) as usize;
                }

                ui.separator();
                ui.text(format!("Leader speed: {:.0}", self.flock.leader.speed()));
                let wp = self.flock.waypoint();
                ui.text(format!(
                    "Waypoint: ({:.0}, {:.0}, {:.0})",
                    wp.x, wp.y, wp.z
                ));
            });
    }

    fn name(&self) -> &str {
        "Flocking"
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn reset(&mut self, scene: &mut Scene) {
        self.flock = Flock::new(
            self.pending_count,
            self.config.bounds,
            self.config.obstacle,
            self.flock.params,
        );
        self.sync_visibility(scene);
        self.sync_transforms(scene);
        log::info!("flock reset with {} members", self.flock.len());
    }

    fn camera_focus(&self) -> Option<CameraFocus> {
        let leader = &self.flock.leader;
        Some(CameraFocus {
            position: leader.position,
            front: leader.front,
            right: leader.right,
            up: leader.up,
            flock_len: self.flock.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, FlightCamera};

    fn test_scene() -> Scene {
        let camera = FlightCamera::new(1.0);
        let controller = CameraController::new(0.8, 200.0);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn small_config() -> FlockConfig {
        FlockConfig {
            count: 4,
            max_count: 8,
            ..FlockConfig::default()
        }
    }

    #[test]
    fn initialize_spawns_the_whole_pool_plus_leader() {
        let mut scene = test_scene();
        let mut sim = FlockSimulation::new(small_config());
        sim.initialize(&mut scene);

        assert_eq!(scene.objects.len(), 9);
        assert_eq!(scene.models.len(), 1);
    }

    #[test]
    fn pool_members_beyond_count_are_hidden() {
        let mut scene = test_scene();
        let mut sim = FlockSimulation::new(small_config());
        sim.initialize(&mut scene);

        let visible = scene
            .objects
            .iter()
            .filter(|o| o.name.starts_with("boid") && o.visible)
            .count();
        assert_eq!(visible, 4);
    }

    #[test]
    fn resize_takes_effect_on_next_update() {
        let mut scene = test_scene();
        let mut sim = FlockSimulation::new(small_config());
        sim.initialize(&mut scene);

        sim.pending_count = 7;
        sim.update(1.0 / 60.0, &mut scene);

        assert_eq!(sim.flock.len(), 7);
        let visible = scene
            .objects
            .iter()
            .filter(|o| o.name.starts_with("boid") && o.visible)
            .count();
        assert_eq!(visible, 7);
    }

    #[test]
    fn update_moves_object_transforms() {
        let mut scene = test_scene();
        let mut sim = FlockSimulation::new(small_config());
        sim.initialize(&mut scene);

        let before = scene.objects[sim.boid_objects[0]].transform;
        for _ in 0..30 {
            sim.update(1.0 / 60.0, &mut scene);
        }
        let after = scene.objects[sim.boid_objects[0]].transform;
        assert_ne!(before, after);
    }

    #[test]
    fn camera_focus_tracks_the_leader() {
        let mut scene = test_scene();
        let mut sim = FlockSimulation::new(small_config());
        sim.initialize(&mut scene);

        let focus = sim.camera_focus().unwrap();
        assert_eq!(focus.position, sim.flock.leader.position);
        assert_eq!(focus.flock_len, 4);
    }

    #[test]
    fn reset_restores_the_requested_count() {
        let mut scene = test_scene();
        let mut sim = FlockSimulation::new(small_config());
        sim.initialize(&mut scene);

        sim.pending_count = 6;
        sim.update(1.0 / 60.0, &mut scene);
        sim.reset(&mut scene);

        assert_eq!(sim.flock.len(), 6);
    }
}
