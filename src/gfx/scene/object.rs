//! Scene objects
//!
//! An [Object] is an instance of a shared [Model](super::model::Model): it
//! carries its own transform, visibility and material, plus the per-object
//! GPU uniform for the transform.

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};
use wgpu::Device;

/// Per-object GPU state: the transform uniform and its bind group.
pub struct ObjectGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    /// Index into the scene's model list.
    pub model: usize,
    pub transform: Matrix4<f32>,
    pub visible: bool,
    pub material_id: Option<String>,
    pub gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    pub fn new(name: &str, model: usize) -> Self {
        Self {
            name: name.to_string(),
            model,
            transform: Matrix4::identity(),
            visible: true,
            gpu_resources: None,
            material_id: None,
        }
    }

    pub fn set_material(&mut self, material_id: &str) {
        self.material_id = Some(material_id.to_string());
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation);
    }

    /// Translation, yaw rotation and uniform scale combined (T * R * S).
    pub fn set_transform_trs(
        &mut self,
        translation: Vector3<f32>,
        rotation_y: Deg<f32>,
        scale: f32,
    ) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_y(rotation_y);
        let s = Matrix4::from_scale(scale);
        self.transform = t * r * s;
    }

    /// Pose with the full flight orientation: translate, yaw around Y, then
    /// pitch around X, then scale. Matches an agent whose model faces +z.
    pub fn set_transform_oriented(
        &mut self,
        translation: Vector3<f32>,
        yaw: Deg<f32>,
        pitch: Deg<f32>,
        scale: f32,
    ) {
        let t = Matrix4::from_translation(translation);
        let ry = Matrix4::from_angle_y(yaw);
        let rx = Matrix4::from_angle_x(pitch);
        let s = Matrix4::from_scale(scale);
        self.transform = t * ry * rx * s;
    }

    /// Syncs the transform to the GPU if resources exist. cgmath matrices
    /// are column-major, which is what the shader expects.
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        if let Some(gpu_resources) = &self.gpu_resources {
            let transform_data: &[f32; 16] = self.transform.as_ref();
            queue.write_buffer(
                &gpu_resources.transform_buffer,
                0,
                bytemuck::cast_slice(transform_data),
            );
        }
    }

    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }

    pub fn init_gpu_resources(&mut self, device: &Device) {
        if self.gpu_resources.is_some() {
            return;
        }

        let transform_data: &[f32; 16] = self.transform.as_ref();
        let transform_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Transform Uniform Buffer"),
                contents: bytemuck::cast_slice(transform_data),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let transform_bind_group_layout = Self::transform_bind_group_layout(device);
        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(ObjectGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }

    /// Layout for the per-object transform uniform, bound at group 1 in all
    /// scene pipelines.
    pub fn transform_bind_group_layout(device: &Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Transform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, InnerSpace, Transform as _};

    #[test]
    fn oriented_transform_points_model_forward_along_heading() {
        // front derived from yaw/pitch the way the boids derive it
        let yaw = Deg(90.0f32);
        let pitch = Deg(0.0f32);

        let mut object = Object::new("boid", 0);
        object.set_transform_oriented(vec3(0.0, 0.0, 0.0), yaw, pitch, 1.0);

        // Model forward is +z; after a 90 degree yaw it should face +x.
        let forward = object
            .transform
            .transform_vector(vec3(0.0, 0.0, 1.0))
            .normalize();
        assert!((forward - vec3(1.0, 0.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn oriented_transform_applies_pitch() {
        // pitch = asin(-front.y), so diving (front.y < 0) means positive pitch
        let mut object = Object::new("boid", 0);
        object.set_transform_oriented(vec3(0.0, 0.0, 0.0), Deg(0.0), Deg(30.0), 1.0);

        let forward = object
            .transform
            .transform_vector(vec3(0.0, 0.0, 1.0))
            .normalize();
        assert!((forward.y - (-0.5)).abs() < 1e-5);
    }

    #[test]
    fn trs_scales_and_translates() {
        let mut object = Object::new("tower", 0);
        object.set_transform_trs(vec3(10.0, 0.0, 0.0), Deg(0.0), 2.0);

        let p = object.transform.transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 12.0).abs() < 1e-5);
    }
}
