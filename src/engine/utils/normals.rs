use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::engine::components::{Face, Vertex};

/// How normals are derived when a mesh carries none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalMode {
    /// Each corner takes the normal of the face that references it last
    Flat,
    /// Vertices sharing a position average the normals of all adjacent faces
    #[default]
    Smooth,
}

/// Unit normal of triangle (a, b, c) by the right-hand rule.
/// Degenerate triangles yield the zero vector.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Returns `vertices` with their normals replaced according to `mode`.
///
/// Vertices not referenced by any face get a zero normal. Faces with indices
/// outside `vertices` are ignored.
pub fn compute_normals(vertices: &[Vertex], faces: &[Face], mode: NormalMode) -> Vec<Vertex> {
    let valid_faces = faces
        .iter()
        .filter(|face| face.iter().all(|&i| (i as usize) < vertices.len()));

    let normals = match mode {
        NormalMode::Flat => {
            let mut normals = vec![Vec3::ZERO; vertices.len()];
            for face in valid_faces {
                let [a, b, c] = face.map(|i| vertices[i as usize].position);
                let normal = face_normal(a, b, c);
                for &index in face {
                    normals[index as usize] = normal;
                }
            }
            normals
        }
        NormalMode::Smooth => {
            // Accumulate per position so seams split by texture coords still blend
            let mut sums: HashMap<[u32; 3], Vec3> = HashMap::new();
            for face in valid_faces {
                let [a, b, c] = face.map(|i| vertices[i as usize].position);
                let normal = face_normal(a, b, c);
                for &index in face {
                    *sums.entry(position_key(vertices[index as usize].position)).or_insert(Vec3::ZERO) +=
                        normal;
                }
            }
            vertices
                .iter()
                .map(|v| {
                    let sum = sums.get(&position_key(v.position)).copied().unwrap_or(Vec3::ZERO);
                    if sum.length_squared() > 0.0 {
                        sum.normalize()
                    } else {
                        sum
                    }
                })
                .collect()
        }
    };

    vertices
        .iter()
        .zip(normals)
        .map(|(vertex, normal)| Vertex {
            normal: Some(normal),
            ..*vertex
        })
        .collect()
}

fn position_key(position: Vec3) -> [u32; 3] {
    position.to_array().map(f32::to_bits)
}
