//! WGPU utility helpers
//!
//! Builders and wrappers for common wgpu plumbing.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
