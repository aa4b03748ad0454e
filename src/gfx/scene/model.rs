//! Shared mesh data
//!
//! A [Model] is loaded or generated once and referenced by index from any
//! number of scene objects, so a whole flock shares one vertex/index buffer
//! set instead of duplicating it per agent.

use std::ops::Range;

use wgpu::Device;

use super::vertex::Vertex3D;

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    /// Builds a mesh from flat position/normal arrays (3 floats per vertex).
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;

        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }

        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Area-weighted smooth normals for meshes that come without any.
    pub fn calculate_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0f32; positions.len()];

        for triangle in indices.chunks(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v0 = [positions[i0 * 3], positions[i0 * 3 + 1], positions[i0 * 3 + 2]];
            let v1 = [positions[i1 * 3], positions[i1 * 3 + 1], positions[i1 * 3 + 2]];
            let v2 = [positions[i2 * 3], positions[i2 * 3 + 1], positions[i2 * 3 + 2]];

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

            // Cross product length carries the area weighting.
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal[0];
                normals[vertex_idx * 3 + 1] += face_normal[1];
                normals[vertex_idx * 3 + 2] += face_normal[2];
            }
        }

        for i in 0..vertex_count {
            let length = (normals[i * 3].powi(2)
                + normals[i * 3 + 1].powi(2)
                + normals[i * 3 + 2].powi(2))
            .sqrt();
            if length > 0.0 {
                normals[i * 3] /= length;
                normals[i * 3 + 1] /= length;
                normals[i * 3 + 2] /= length;
            }
        }

        normals
    }

    pub fn init_gpu_resources(&mut self, device: &Device) {
        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }
}

/// A named set of meshes shared between scene objects.
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(name: &str, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.to_string(),
            meshes,
        }
    }

    pub fn init_gpu_resources(&mut self, device: &Device) {
        for mesh in &mut self.meshes {
            mesh.init_gpu_resources(device);
        }
    }

    pub fn triangle_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.index_count / 3).sum()
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_model(&mut self, model: &'a Model);
    fn draw_model_instanced(&mut self, model: &'a Model, instances: Range<u32>);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        // Skip meshes that have not been uploaded.
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return,
        };
        let index_buffer = match &mesh.index_buffer {
            Some(buffer) => buffer,
            None => return,
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_model(&mut self, model: &'b Model) {
        self.draw_model_instanced(model, 0..1);
    }

    fn draw_model_instanced(&mut self, model: &'b Model, instances: Range<u32>) {
        for mesh in &model.meshes {
            self.draw_mesh_instanced(mesh, instances.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computed_normals_are_unit_length() {
        // One triangle in the xz plane, normal should be +y or -y.
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let indices = vec![0, 1, 2];
        let normals = Mesh::calculate_normals(&positions, &indices);

        for chunk in normals.chunks(3) {
            let len = (chunk[0].powi(2) + chunk[1].powi(2) + chunk[2].powi(2)).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
            assert!(chunk[1].abs() > 0.99);
        }
    }

    #[test]
    fn mesh_interleaves_vertices() {
        let positions = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let normals = vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = Mesh::new(positions, normals, vec![0, 1, 0]);

        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertices[1].position, [4.0, 5.0, 6.0]);
    }
}
