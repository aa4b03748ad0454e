//! Material system
//!
//! Materials are stored centrally in [MaterialManager] and referenced by name
//! from scene objects, so a whole flock shares one material uniform. Lookup
//! always falls back to the default material.

use std::collections::HashMap;
use wgpu::Device;

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

pub type MaterialId = String;

/// GPU-side material data. Must match the shader's Material struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    // WGSL aligns the following vec3 to 16 bytes
    _padding0: [f32; 2],
    pub emissive: [f32; 3],
    _padding1: f32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Bind group management for one material (group 2 in the scene pipeline).
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Material Bind Group Layout");

        MaterialBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &Device, ubo: &MaterialUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Material Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],

    material_ubo: Option<MaterialUBO>,
    material_bindings: Option<MaterialBindings>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            material_ubo: None,
            material_bindings: None,
        }
    }
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            emissive: [0.0, 0.0, 0.0],
            material_ubo: None,
            material_bindings: None,
        }
    }

    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    /// Creates GPU resources on first use, then syncs the uniform data.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        if self.material_ubo.is_none() {
            self.material_ubo = Some(MaterialUBO::new(device));
        }

        if self.material_bindings.is_none() {
            let mut bindings = MaterialBindings::new(device);
            if let Some(ubo) = &self.material_ubo {
                bindings.create_bind_group(device, ubo);
            }
            self.material_bindings = Some(bindings);
        }

        let uniform_data = MaterialUniform {
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            _padding0: [0.0; 2],
            emissive: self.emissive,
            _padding1: 0.0,
        };

        if let Some(ubo) = &mut self.material_ubo {
            ubo.update_content(queue, uniform_data);
        }
    }

    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.material_bindings.as_ref().and_then(|b| b.bind_group())
    }

    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.material_bindings
            .as_ref()
            .map(|b| b.bind_group_layouts())
    }
}

/// Central material storage with a guaranteed default entry.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl MaterialManager {
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            default_material_id: "Default".to_string(),
        };
        manager
            .materials
            .insert("Default".to_string(), Material::default());
        manager
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn get_default_material(&self) -> &Material {
        // The default entry is inserted in new() and never removed.
        &self.materials[&self.default_material_id]
    }

    /// Material for an object: the named material if it exists, otherwise
    /// the default.
    pub fn get_material_for_object(&self, material_id: Option<&MaterialId>) -> &Material {
        match material_id {
            Some(id) => self
                .get_material(id)
                .unwrap_or_else(|| self.get_default_material()),
            None => self.get_default_material(),
        }
    }

    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    pub fn update_all_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue);
        }
    }

    /// Shared layout for pipeline creation; all materials use the same one.
    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.get_default_material().get_bind_group_layout()
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_material_falls_back_to_default() {
        let manager = MaterialManager::new();
        let id = "does-not-exist".to_string();
        let material = manager.get_material_for_object(Some(&id));
        assert_eq!(material.name, "Default");
    }

    #[test]
    fn added_material_is_found_by_name() {
        let mut manager = MaterialManager::new();
        manager.add_material(Material::new("fish", [1.0, 0.5, 0.2, 1.0], 0.0, 0.7));

        let id = "fish".to_string();
        let material = manager.get_material_for_object(Some(&id));
        assert_eq!(material.name, "fish");
        assert_eq!(material.base_color[0], 1.0);
    }

    #[test]
    fn material_factors_are_clamped() {
        let material = Material::new("shiny", [1.0; 4], 5.0, -1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }
}
