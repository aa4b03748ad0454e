//! Procedural primitive generation
//!
//! Built-in geometry for the demo scene so it runs without any asset files:
//! a low-poly fish for the flock, a ground plane and a cylindrical tower.
//! All shapes come with smooth normals and are returned as ready [Model]s.

use std::f32::consts::TAU;

use crate::gfx::scene::model::{Mesh, Model};

/// A low-poly fish, roughly 2 units long, facing +z.
///
/// Forward must be +z: the flock orients objects by yaw/pitch rotations that
/// assume the model's nose points along the positive z axis.
pub fn fish_model() -> Model {
    // Body cross-section rings from tail (-z) to nose (+z).
    // (z, half_width, half_height)
    let rings: [(f32, f32, f32); 5] = [
        (-1.0, 0.02, 0.25), // tail fin edge, tall and thin
        (-0.55, 0.06, 0.10),
        (-0.1, 0.18, 0.28), // mid body
        (0.5, 0.14, 0.20),
        (0.9, 0.04, 0.05), // nose taper
    ];

    let mut positions: Vec<f32> = Vec::new();
    for &(z, hw, hh) in &rings {
        // diamond cross-section: top, right, bottom, left
        positions.extend_from_slice(&[0.0, hh, z]);
        positions.extend_from_slice(&[hw, 0.0, z]);
        positions.extend_from_slice(&[0.0, -hh, z]);
        positions.extend_from_slice(&[-hw, 0.0, z]);
    }
    // nose tip and tail tip
    let nose_tip = (positions.len() / 3) as u32;
    positions.extend_from_slice(&[0.0, 0.0, 1.0]);
    let tail_tip = (positions.len() / 3) as u32;
    positions.extend_from_slice(&[0.0, 0.0, -1.05]);

    let mut indices: Vec<u32> = Vec::new();
    // quads between consecutive rings, two triangles each
    for ring in 0..rings.len() - 1 {
        let a = (ring * 4) as u32;
        let b = a + 4;
        for corner in 0..4u32 {
            let next = (corner + 1) % 4;
            indices.extend_from_slice(&[a + corner, b + corner, b + next]);
            indices.extend_from_slice(&[a + corner, b + next, a + next]);
        }
    }
    // cap nose and tail with fans
    let last_ring = ((rings.len() - 1) * 4) as u32;
    for corner in 0..4u32 {
        let next = (corner + 1) % 4;
        indices.extend_from_slice(&[last_ring + corner, nose_tip, last_ring + next]);
        indices.extend_from_slice(&[corner, next, tail_tip]);
    }

    let normals = Mesh::calculate_normals(&positions, &indices);
    Model::new("fish", vec![Mesh::new(positions, normals, indices)])
}

/// A flat square ground plane spanning `±extent` in x and z at y = 0.
pub fn ground_model(extent: f32) -> Model {
    let positions = vec![
        -extent, 0.0, -extent, //
        extent, 0.0, -extent, //
        extent, 0.0, extent, //
        -extent, 0.0, extent,
    ];
    let normals = vec![
        0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];

    Model::new("ground", vec![Mesh::new(positions, normals, indices)])
}

/// A closed cylinder of the given radius and height, base at y = 0.
pub fn tower_model(radius: f32, height: f32, segments: u32) -> Model {
    let segments = segments.max(3);
    let mut positions: Vec<f32> = Vec::new();
    let mut normals: Vec<f32> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    // side rings share vertices so the shading is smooth around the barrel
    for i in 0..segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        for &y in &[0.0, height] {
            positions.extend_from_slice(&[radius * cos, y, radius * sin]);
            normals.extend_from_slice(&[cos, 0.0, sin]);
        }
    }
    for i in 0..segments {
        let a = i * 2;
        let b = ((i + 1) % segments) * 2;
        indices.extend_from_slice(&[a, a + 1, b + 1]);
        indices.extend_from_slice(&[a, b + 1, b]);
    }

    // flat caps get their own vertices so the rim stays hard
    let base_center = (positions.len() / 3) as u32;
    positions.extend_from_slice(&[0.0, 0.0, 0.0]);
    normals.extend_from_slice(&[0.0, -1.0, 0.0]);
    let top_center = (positions.len() / 3) as u32;
    positions.extend_from_slice(&[0.0, height, 0.0]);
    normals.extend_from_slice(&[0.0, 1.0, 0.0]);

    let cap_start = (positions.len() / 3) as u32;
    for i in 0..segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        positions.extend_from_slice(&[radius * cos, 0.0, radius * sin]);
        normals.extend_from_slice(&[0.0, -1.0, 0.0]);
        positions.extend_from_slice(&[radius * cos, height, radius * sin]);
        normals.extend_from_slice(&[0.0, 1.0, 0.0]);
    }
    for i in 0..segments {
        let a = cap_start + i * 2;
        let b = cap_start + ((i + 1) % segments) * 2;
        indices.extend_from_slice(&[base_center, a, b]);
        indices.extend_from_slice(&[top_center, b + 1, a + 1]);
    }

    Model::new("tower", vec![Mesh::new(positions, normals, indices)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fish_nose_is_forward() {
        let model = fish_model();
        assert_eq!(model.name, "fish");
        assert!(model.triangle_count() > 0);
    }

    #[test]
    fn tower_scales_with_segments() {
        let coarse = tower_model(50.0, 600.0, 8);
        let fine = tower_model(50.0, 600.0, 32);
        assert!(fine.triangle_count() > coarse.triangle_count());
    }

    #[test]
    fn degenerate_segment_count_is_clamped() {
        let model = tower_model(10.0, 10.0, 1);
        assert!(model.triangle_count() >= 3);
    }

    #[test]
    fn ground_is_two_triangles() {
        assert_eq!(ground_model(2000.0).triangle_count(), 2);
    }
}
