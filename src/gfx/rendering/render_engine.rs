//! wgpu-based rendering engine
//!
//! Two-pass renderer: a depth-only shadow pass from the light's point of
//! view, then the main pass with Blinn-Phong shading, hardware shadow
//! comparison and the underwater caustics term. A UI overlay callback runs
//! last into the same encoder.

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::gfx::{
    camera::camera_utils::CameraUniform,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig},
        material::MaterialBindings,
        texture_resource::TextureResource,
    },
    scene::{DrawModel, Object, Scene},
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shadow_cache::ShadowCache;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
    binding_types,
};

const SHADOW_MAP_SIZE: u32 = 4096;

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    shadow_map: TextureResource,
    shadow_bind_group: wgpu::BindGroup,

    light_config: LightConfig,
    shadow_cache: ShadowCache,
}

impl RenderEngine {
    /// Initializes wgpu for the given window, builds the depth and shadow
    /// targets and registers the two render pipelines.
    ///
    /// # Panics
    /// Panics if no adapter or device is available. There is no way to
    /// render without one, so startup fails loudly.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .expect("Failed to create surface!");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: SHADOW_MAP_SIZE,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        // Group 3 in the scene pipeline: shadow map plus comparison sampler.
        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Bind Group Layout");

        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(&device, "Shadow Bind Group");

        let light_config = LightConfig::default();
        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let transform_bind_group_layout = Object::transform_bind_group_layout(&device);

        // All materials share the same layout; a throwaway binding gives it
        // to us before any material has GPU resources.
        let material_bindings = MaterialBindings::new(&device);
        let material_bind_group_layout = material_bindings.bind_group_layouts().clone();

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("shaders/scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shaders/shadow_pass.wgsl"));

        // No culling in the shadow pass, closed meshes self-shadow better
        // with both faces in the map.
        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_depth_stencil(shadow_map.texture.clone())
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_bind_group_layout.clone(),
                ])
                .with_color_targets(vec![])
                .with_vertex_only(),
        );

        pipeline_manager.register_pipeline(
            "Scene",
            PipelineConfig::default()
                .with_label("SCENE")
                .with_shader("scene")
                .with_depth_stencil(depth_texture.texture.clone())
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_bind_group_layout,
                    material_bind_group_layout,
                    shadow_layout.layout.clone(),
                ]),
        );

        if let Err(err) = pipeline_manager.create_all_pipelines() {
            log::error!("pipeline creation failed: {err}");
        }

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            shadow_map,
            shadow_bind_group,
            light_config,
            shadow_cache: ShadowCache::new(),
        }
    }

    /// Renders one frame: shadow pass (when the cache is stale), main pass,
    /// then the UI overlay callback into the same encoder.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(err) => {
                log::error!("failed to acquire surface texture: {err}");
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let needs_shadow_update = self.shadow_cache.needs_update(&self.light_config, scene);
        if needs_shadow_update {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline("Shadow") {
                shadow_pass.set_pipeline(shadow_pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);

                for object in scene.objects.iter().filter(|o| o.visible) {
                    let (Some(transform_bind_group), Some(model)) =
                        (object.get_transform_bind_group(), scene.get_model(object.model))
                    else {
                        continue;
                    };
                    shadow_pass.set_bind_group(1, transform_bind_group, &[]);
                    shadow_pass.draw_model(model);
                }
            }
        }

        if needs_shadow_update {
            self.shadow_cache.mark_valid(&self.light_config, scene);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.08,
                            b: 0.15,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Scene") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);
                render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);

                for object in scene.objects.iter().filter(|o| o.visible) {
                    let (Some(transform_bind_group), Some(model)) =
                        (object.get_transform_bind_group(), scene.get_model(object.model))
                    else {
                        continue;
                    };

                    let material = scene.get_material_for_object(object);
                    let Some(material_bind_group) = material.get_bind_group() else {
                        log::debug!(
                            "skipping '{}', material '{}' has no GPU resources",
                            object.name,
                            material.name
                        );
                        continue;
                    };

                    render_pass.set_bind_group(1, transform_bind_group, &[]);
                    render_pass.set_bind_group(2, material_bind_group, &[]);
                    render_pass.draw_model(model);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Writes the per-frame globals: camera, light, elapsed time and the
    /// water surface height.
    pub fn update(&mut self, camera_uniform: CameraUniform, time: f32, water_height: f32) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera_uniform,
            self.light_config,
            time,
            water_height,
        );
    }

    pub fn set_light(&mut self, light_config: LightConfig) {
        self.light_config = light_config;
        self.shadow_cache.invalidate();
    }

    pub fn get_light(&self) -> LightConfig {
        self.light_config
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = if enable {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        };
        self.surface.configure(&self.device, &self.config);
    }

    pub fn invalidate_shadow_cache(&mut self) {
        self.shadow_cache.invalidate();
    }
}
