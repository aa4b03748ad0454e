//! Global uniform bindings
//!
//! One uniform buffer shared by every pipeline (bind group 0): camera
//! matrices, the light used for shadow mapping, elapsed time for animated
//! effects, and the water surface height that gates the caustics term.

use cgmath::{Matrix4, Point3, Vector3};

use crate::{
    gfx::camera::{camera_utils::CameraUniform, flight_camera::OPENGL_TO_WGPU_MATRIX},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Must match the GlobalUniform struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],

    light_position: [f32; 3],
    _padding0: f32,
    light_color: [f32; 3],
    light_intensity: f32,
    light_view_proj: [[f32; 4]; 4],

    /// Seconds since startup, drives the caustics animation.
    time: f32,
    /// World-space height of the water surface; fragments below it get the
    /// caustics term.
    water_height: f32,
    _padding1: [f32; 2],
}

unsafe impl bytemuck::Pod for GlobalUBOContent {}
unsafe impl bytemuck::Zeroable for GlobalUBOContent {}

/// Directional-ish light used for shading and shadow mapping.
#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [1500.0, 3000.0, 1500.0],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Half-extent of the light's orthographic shadow volume. The far corners of
/// the flight ceiling sit ~2890 units from the light axis, so anything
/// smaller clips them out of the shadow map.
const SHADOW_ORTHO_EXTENT: f32 = 3000.0;

/// Light-space view-projection used by both the shadow pass and the shadow
/// comparison in the main pass.
///
/// `cgmath::ortho` produces GL clip z in [-1, 1]; the correction matrix
/// remaps it to the [0, 1] range wgpu clips against, same as the camera
/// projection.
pub fn light_view_projection(light: &LightConfig) -> Matrix4<f32> {
    let light_pos = Point3::new(light.position[0], light.position[1], light.position[2]);
    let light_view = Matrix4::look_at_rh(light_pos, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
    let light_proj = cgmath::ortho(
        -SHADOW_ORTHO_EXTENT,
        SHADOW_ORTHO_EXTENT,
        -SHADOW_ORTHO_EXTENT,
        SHADOW_ORTHO_EXTENT,
        100.0,
        8000.0,
    );
    OPENGL_TO_WGPU_MATRIX * light_proj * light_view
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Writes the per-frame global uniform state.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
    time: f32,
    water_height: f32,
) {
    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        light_position: light.position,
        _padding0: 0.0,
        light_color: light.color,
        light_intensity: light.intensity,
        light_view_proj: light_view_projection(&light).into(),
        time,
        water_height,
        _padding1: [0.0; 2],
    };

    ubo.update_content(queue, content);
}

/// Bind group 0 in every render pipeline.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Globals Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` has not been called.
    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_ubo_content_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }

    #[test]
    fn light_projection_covers_the_world_volume() {
        use cgmath::Transform;

        let light = LightConfig::default();
        let vp = light_view_projection(&light);

        // Every corner of the world volume must land inside clip space,
        // with z in the [0, 1] band wgpu clips against.
        for &x in &[-2000.0f32, 2000.0] {
            for &y in &[100.0f32, 1000.0] {
                for &z in &[-2000.0f32, 2000.0] {
                    let p = vp.transform_point(Point3::new(x, y, z));
                    assert!(p.x.abs() <= 1.0, "x out of clip space for ({x},{y},{z})");
                    assert!(p.y.abs() <= 1.0, "y out of clip space for ({x},{y},{z})");
                    assert!(
                        (0.0..=1.0).contains(&p.z),
                        "z out of clip space for ({x},{y},{z})"
                    );
                }
            }
        }
    }

    #[test]
    fn light_projection_keeps_world_center_in_depth_range() {
        use cgmath::Transform;

        let vp = light_view_projection(&LightConfig::default());
        let p = vp.transform_point(Point3::new(0.0, 550.0, 0.0));
        assert!((0.0..=1.0).contains(&p.z));
    }
}
