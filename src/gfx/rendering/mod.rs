//! Rendering internals: the engine, pipeline management and shadow caching.

pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow_cache;

pub use pipeline_manager::{PipelineConfig, PipelineError, PipelineManager};
pub use render_engine::RenderEngine;
pub use shadow_cache::ShadowCache;
