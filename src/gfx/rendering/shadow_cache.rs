//! Shadow map caching
//!
//! The shadow pass only re-renders when the light or an object transform
//! actually changed. With a few hundred fish moving every frame the cache
//! mostly stays dirty, but it pays off whenever the simulation is paused.

use std::collections::HashMap;

use crate::gfx::{resources::LightConfig, scene::Scene};

const EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
struct LightState {
    position: [f32; 3],
    intensity: f32,
}

impl LightState {
    fn from_config(light: &LightConfig) -> Self {
        Self {
            position: light.position,
            intensity: light.intensity,
        }
    }

    fn differs_from(&self, other: &LightState) -> bool {
        self.position
            .iter()
            .zip(other.position.iter())
            .any(|(a, b)| (a - b).abs() > EPSILON)
            || (self.intensity - other.intensity).abs() > EPSILON
    }
}

#[derive(Debug, Clone, Copy)]
struct ObjectTransformState {
    transform: [[f32; 4]; 4],
    visible: bool,
}

impl ObjectTransformState {
    fn differs_from(&self, other: &ObjectTransformState) -> bool {
        if self.visible != other.visible {
            return true;
        }
        for (row_a, row_b) in self.transform.iter().zip(other.transform.iter()) {
            for (a, b) in row_a.iter().zip(row_b.iter()) {
                if (a - b).abs() > EPSILON {
                    return true;
                }
            }
        }
        false
    }
}

/// Tracks the last-rendered shadow state and answers "does the shadow map
/// need re-rendering this frame".
pub struct ShadowCache {
    last_light: Option<LightState>,
    last_transforms: HashMap<String, ObjectTransformState>,
    valid: bool,
}

impl ShadowCache {
    pub fn new() -> Self {
        Self {
            last_light: None,
            last_transforms: HashMap::new(),
            valid: false,
        }
    }

    /// Compares the current light and scene against the cached state.
    pub fn needs_update(&self, light: &LightConfig, scene: &Scene) -> bool {
        if !self.valid {
            return true;
        }

        let light_state = LightState::from_config(light);
        match &self.last_light {
            Some(last) => {
                if last.differs_from(&light_state) {
                    return true;
                }
            }
            None => return true,
        }

        let mut seen = 0usize;
        for object in &scene.objects {
            let current = ObjectTransformState {
                transform: object.transform.into(),
                visible: object.visible,
            };
            match self.last_transforms.get(&object.name) {
                Some(last) => {
                    if last.differs_from(&current) {
                        return true;
                    }
                }
                None => return true,
            }
            seen += 1;
        }

        // Removed objects also invalidate the map.
        seen != self.last_transforms.len()
    }

    /// Records the state that was just rendered into the shadow map.
    pub fn mark_valid(&mut self, light: &LightConfig, scene: &Scene) {
        self.last_light = Some(LightState::from_config(light));
        self.last_transforms.clear();
        for object in &scene.objects {
            let transform: [[f32; 4]; 4] = object.transform.into();
            self.last_transforms.insert(
                object.name.clone(),
                ObjectTransformState {
                    transform,
                    visible: object.visible,
                },
            );
        }
        self.valid = true;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn tracked_objects(&self) -> usize {
        self.last_transforms.len()
    }
}

impl Default for ShadowCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::{CameraController, CameraManager, FlightCamera},
        geometry,
        scene::Scene,
    };
    use cgmath::Vector3;

    fn test_scene() -> (Scene, usize) {
        let camera = FlightCamera::new(1.0);
        let controller = CameraController::new(0.8, 200.0);
        let mut scene = Scene::new(CameraManager::new(camera, controller));
        let model = scene.add_model(geometry::fish_model());
        let fish = scene.spawn(model, "fish");
        (scene, fish)
    }

    #[test]
    fn fresh_cache_needs_update() {
        let cache = ShadowCache::new();
        let (scene, _) = test_scene();
        assert!(cache.needs_update(&LightConfig::default(), &scene));
    }

    #[test]
    fn unchanged_scene_stays_valid() {
        let mut cache = ShadowCache::new();
        let (scene, _) = test_scene();
        let light = LightConfig::default();

        cache.mark_valid(&light, &scene);
        assert!(!cache.needs_update(&light, &scene));
        assert_eq!(cache.tracked_objects(), 1);
    }

    #[test]
    fn moved_light_invalidates() {
        let mut cache = ShadowCache::new();
        let (scene, _) = test_scene();
        let mut light = LightConfig::default();

        cache.mark_valid(&light, &scene);
        light.position[1] += 500.0;
        assert!(cache.needs_update(&light, &scene));
    }

    #[test]
    fn moved_object_invalidates() {
        let mut cache = ShadowCache::new();
        let (mut scene, fish) = test_scene();
        let light = LightConfig::default();

        cache.mark_valid(&light, &scene);
        if let Some(object) = scene.get_object_mut(fish) {
            object.set_translation(Vector3::new(10.0, 0.0, 0.0));
        }
        assert!(cache.needs_update(&light, &scene));
    }

    #[test]
    fn hidden_object_invalidates() {
        let mut cache = ShadowCache::new();
        let (mut scene, fish) = test_scene();
        let light = LightConfig::default();

        cache.mark_valid(&light, &scene);
        if let Some(object) = scene.get_object_mut(fish) {
            object.visible = false;
        }
        assert!(cache.needs_update(&light, &scene));
    }

    #[test]
    fn explicit_invalidate_forces_update() {
        let mut cache = ShadowCache::new();
        let (scene, _) = test_scene();
        let light = LightConfig::default();

        cache.mark_valid(&light, &scene);
        cache.invalidate();
        assert!(cache.needs_update(&light, &scene));
    }
}
