//! Render pipeline management
//!
//! Named pipeline configurations with lazy creation and a shader registry.
//! Pipelines are registered up front and built on first use or in bulk via
//! [PipelineManager::create_all_pipelines].

use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("shader '{0}' is not loaded")]
    ShaderNotFound(String),
    #[error("pipeline '{0}' is not registered")]
    NotRegistered(String),
}

/// Everything needed to build one render pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_texture: Option<Texture>,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
    /// Depth-only pipelines (the shadow pass) skip the fragment stage.
    pub vertex_only: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Pipeline".to_string(),
            shader: "scene".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_texture: None,
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            vertex_only: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_depth_stencil(mut self, texture: Texture) -> Self {
        self.depth_texture = Some(texture);
        self
    }

    pub fn with_color_targets(mut self, targets: Vec<Option<ColorTargetState>>) -> Self {
        self.color_targets = targets;
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self
    }
}

pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a configuration without building it; pipelines are created
    /// lazily on first `get_pipeline` or eagerly via `create_all_pipelines`.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if self.pipelines.contains_key(name) {
            return self.pipelines.get(name);
        }

        if let Some(config) = self.pipeline_configs.get(name).cloned() {
            match self.create_pipeline_from_config(name, &config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.to_string(), pipeline);
                    self.pending_pipelines.retain(|n| n != name);
                    return self.pipelines.get(name);
                }
                Err(err) => {
                    log::error!("failed to create pipeline '{name}': {err}");
                    return None;
                }
            }
        }

        None
    }

    /// Builds every registered-but-uncreated pipeline, failing on the first
    /// error so configuration mistakes surface at startup.
    pub fn create_all_pipelines(&mut self) -> Result<(), PipelineError> {
        let pending = self.pending_pipelines.clone();
        for name in pending {
            let config = self
                .pipeline_configs
                .get(&name)
                .cloned()
                .ok_or_else(|| PipelineError::NotRegistered(name.clone()))?;
            let pipeline = self.create_pipeline_from_config(&name, &config)?;
            self.pipelines.insert(name.clone(), pipeline);
            self.pending_pipelines.retain(|n| n != &name);
        }
        Ok(())
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, PipelineError> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| PipelineError::ShaderNotFound(config.shader.clone()))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{name} Layout")),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let fragment_state = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        let depth_stencil = config
            .depth_texture
            .as_ref()
            .map(|texture| DepthStencilState {
                format: texture.format(),
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: fragment_state,
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }

    pub fn list_pipelines(&self) -> Vec<&String> {
        self.pipeline_configs.keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_chains() {
        let config = PipelineConfig::default()
            .with_label("SHADOW")
            .with_shader("shadow")
            .with_cull_mode(None)
            .with_vertex_only()
            .with_color_targets(vec![]);

        assert_eq!(config.label, "SHADOW");
        assert_eq!(config.shader, "shadow");
        assert!(config.vertex_only);
        assert!(config.cull_mode.is_none());
        assert!(config.color_targets.is_empty());
    }

    #[test]
    fn errors_name_the_missing_piece() {
        let err = PipelineError::ShaderNotFound("caustics".to_string());
        assert!(err.to_string().contains("caustics"));
    }
}
