//! Procedural meshes.

use glam::{Vec3, Vec4};

use crate::model::{Model, ModelPrimitive, Vertex};

/// (normal, u, v) per face, with `u × v == normal` so that the corners
/// emitted below wind counter-clockwise seen from outside.
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
];

/// Axis-aligned box centered on the origin, 24 vertices with flat normals.
pub fn box_model(name: &str, size: Vec3, color: Vec4) -> Model {
    let half = size * 0.5;
    let color = color.to_array();

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in BOX_FACES {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = normal + u * su + v * sv;
            vertices.push(Vertex {
                position: corner * half,
                normal,
                color,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Model::new(
        name,
        vec![ModelPrimitive {
            index: 0,
            vertices,
            indices,
        }],
    )
}

/// `0xrrggbb` to RGBA with alpha 1.
pub fn rgb(value: u32) -> Vec4 {
    let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
    Vec4::new(channel(16), channel(8), channel(0), 1.0)
}
