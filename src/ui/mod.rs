//! User interface overlay built on imgui.

pub mod manager;

pub use manager::UiManager;
