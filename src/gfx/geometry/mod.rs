//! Procedural geometry

pub mod primitives;

pub use primitives::{fish_model, ground_model, tower_model};
