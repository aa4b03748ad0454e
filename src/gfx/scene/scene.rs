use anyhow::Context;
use wgpu::Device;

use crate::gfx::{
    camera::CameraManager,
    resources::material::{Material, MaterialManager},
};

use super::model::{Mesh, Model};
use super::object::Object;

/// Main scene: shared models, object instances, materials and the camera.
pub struct Scene {
    pub camera_manager: CameraManager,
    pub models: Vec<Model>,
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            models: Vec::new(),
            objects: Vec::new(),
            material_manager: MaterialManager::new(),
        }
    }

    /// Updates per-frame scene state (camera matrices).
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Loads a model from an OBJ file, importing MTL materials when present.
    ///
    /// Returns the model index for spawning objects. Mesh data is stored once
    /// regardless of how many objects reference it.
    pub fn load_model(&mut self, path: &str) -> anyhow::Result<usize> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .with_context(|| format!("failed to load OBJ file '{path}'"))?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("no usable MTL for '{path}' ({err}), using default materials");
            Vec::new()
        });

        for (i, mtl) in materials.iter().enumerate() {
            let material_name = if mtl.name.is_empty() {
                format!("material_{i}")
            } else {
                mtl.name.clone()
            };
            if self.material_manager.get_material(&material_name).is_some() {
                continue;
            }

            let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            let material = Material::new(
                &material_name,
                [
                    diffuse[0],
                    diffuse[1],
                    diffuse[2],
                    mtl.dissolve.unwrap_or(1.0),
                ],
                0.0,
                // MTL shininess mapped onto roughness
                1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
            );
            self.material_manager.add_material(material);
        }

        let mut meshes = Vec::new();
        for m in models.iter() {
            let mesh = &m.mesh;
            let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len()
            {
                mesh.normals.clone()
            } else {
                Mesh::calculate_normals(&mesh.positions, &mesh.indices)
            };
            meshes.push(Mesh::new(
                mesh.positions.clone(),
                normals,
                mesh.indices.clone(),
            ));
        }

        let name = models
            .first()
            .filter(|m| !m.name.is_empty())
            .map(|m| m.name.clone())
            .unwrap_or_else(|| path.to_string());

        log::info!(
            "loaded model '{}' ({} meshes) from '{}'",
            name,
            meshes.len(),
            path
        );
        Ok(self.add_model(Model::new(&name, meshes)))
    }

    /// Registers a pre-built model (procedural geometry) and returns its index.
    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    /// Spawns an object referencing `model` and returns the object index.
    pub fn spawn(&mut self, model: usize, name: &str) -> usize {
        let name = self.ensure_unique_name(name);
        self.objects.push(Object::new(&name, model));
        self.objects.len() - 1
    }

    pub fn get_object(&self, index: usize) -> Option<&Object> {
        self.objects.get(index)
    }

    pub fn get_object_mut(&mut self, index: usize) -> Option<&mut Object> {
        self.objects.get_mut(index)
    }

    pub fn get_model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn add_material(
        &mut self,
        name: &str,
        base_color: [f32; 4],
        metallic: f32,
        roughness: f32,
    ) {
        let material = Material::new(name, base_color, metallic, roughness);
        self.material_manager.add_material(material);
    }

    pub fn add_material_rgb(&mut self, name: &str, r: f32, g: f32, b: f32, metallic: f32, roughness: f32) {
        self.add_material(name, [r, g, b, 1.0], metallic, roughness);
    }

    /// Material lookup with fallback to the default material.
    pub fn get_material_for_object(&self, object: &Object) -> &Material {
        self.material_manager
            .get_material_for_object(object.material_id.as_ref())
    }

    /// Uploads mesh buffers, transform uniforms and material uniforms.
    /// Must be called once the GPU context exists and again after new models
    /// or objects are added.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for model in self.models.iter_mut() {
            model.init_gpu_resources(device);
        }
        for object in self.objects.iter_mut() {
            object.init_gpu_resources(device);
        }
        self.material_manager.update_all_gpu_resources(device, queue);
    }

    /// Syncs every object transform to the GPU.
    pub fn update_all_transforms(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            if object.gpu_resources.is_some() {
                object.update_transform(queue);
            }
        }
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();
        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{desired_name} ({counter})");
        }
        test_name
    }

    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            model_count: self.models.len(),
            object_count: self.objects.len(),
            material_count: self.material_manager.list_materials().len(),
            total_triangles: self.models.iter().map(|m| m.triangle_count()).sum(),
        }
    }
}

#[derive(Debug)]
pub struct SceneStatistics {
    pub model_count: usize,
    pub object_count: usize,
    pub material_count: usize,
    pub total_triangles: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, FlightCamera};
    use crate::gfx::geometry::primitives;

    fn test_scene() -> Scene {
        let camera = FlightCamera::new(1.0);
        let controller = CameraController::new(0.8, 200.0);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn spawned_objects_share_one_model() {
        let mut scene = test_scene();
        let model = scene.add_model(primitives::fish_model());

        let a = scene.spawn(model, "boid");
        let b = scene.spawn(model, "boid");

        assert_eq!(scene.models.len(), 1);
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[a].model, scene.objects[b].model);
    }

    #[test]
    fn object_names_are_unique() {
        let mut scene = test_scene();
        let model = scene.add_model(primitives::fish_model());
        scene.spawn(model, "boid");
        let second = scene.spawn(model, "boid");
        assert_ne!(scene.objects[second].name, "boid");
    }

    #[test]
    fn missing_obj_file_is_an_error() {
        let mut scene = test_scene();
        assert!(scene.load_model("does/not/exist.obj").is_err());
    }

    #[test]
    fn material_fallback_uses_default() {
        let scene = test_scene();
        let object = Object::new("orphan", 0);
        let material = scene.get_material_for_object(&object);
        assert_eq!(material.name, "Default");
    }
}
