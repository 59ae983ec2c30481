//! Procedural primitives: textured quads, thick line segments and wireframes.

use glam::{Vec2, Vec3};

use super::{Face, Mesh, MeshGroup, Vertex};
use crate::engine::errors::RenderError;
use crate::engine::gpu::GraphicsDevice;
use crate::engine::utils::NormalMode;

/// Texture coordinates for corners given in order
const QUAD_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

const QUAD_FACES: [Face; 2] = [[0, 1, 2], [0, 2, 3]];

/// Quad through four corners given in winding order, with flat normals
pub fn quad(name: impl Into<String>, corners: [Vec3; 4]) -> Mesh {
    let vertices = corners
        .iter()
        .zip(QUAD_UVS)
        .map(|(corner, uv)| Vertex::new(*corner).with_texture_coord(uv))
        .collect();
    Mesh::new(name, vertices, QUAD_FACES.to_vec()).with_derived_normals(NormalMode::Flat)
}

/// Corners of a segment from `start` to `end` widened by `width` in the XY plane
pub fn line_corners(start: Vec3, end: Vec3, width: f32) -> [Vec3; 4] {
    let direction = (end - start).normalize_or_zero();
    let offset = Vec3::new(-direction.y, direction.x, 0.0) * (width / 2.0);
    [start - offset, start + offset, end + offset, end - offset]
}

pub fn line(name: impl Into<String>, start: Vec3, end: Vec3, width: f32) -> Mesh {
    quad(name, line_corners(start, end, width))
}

/// One line per triangle edge of `target`. Shared edges are drawn once per face.
pub fn wireframe(target: &Mesh, width: f32) -> MeshGroup {
    let vertices = target.vertices();
    let mut group = MeshGroup::new(format!("{}_wireframe", target.name()));
    for (face_index, face) in target.faces().iter().enumerate() {
        for edge in 0..3 {
            let start = vertices[face[edge] as usize].position;
            let end = vertices[face[(edge + 1) % 3] as usize].position;
            group.add(line(format!("{}_edge_{}_{}", target.name(), face_index, edge), start, end, width));
        }
    }
    group
}

/// Moves the corners of a quad created by [`quad`] or [`line`]
pub fn update_quad(mesh: &mut Mesh, gl: &dyn GraphicsDevice, corners: [Vec3; 4]) -> Result<(), RenderError> {
    mesh.update_vertices(gl, &corners)
}

pub fn update_line(
    mesh: &mut Mesh,
    gl: &dyn GraphicsDevice,
    start: Vec3,
    end: Vec3,
    width: f32,
) -> Result<(), RenderError> {
    update_quad(mesh, gl, line_corners(start, end, width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::MeshUsage;
    use crate::engine::gpu::recording::RecordingDevice;
    use crate::engine::shaders::contract::tests::basic_contract;

    const UNIT_SQUARE: [Vec3; 4] = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
    ];

    #[test]
    fn quad_has_uvs_and_flat_normals() {
        let mesh = quad("quad", UNIT_SQUARE);

        assert_eq!(mesh.faces(), &QUAD_FACES);
        assert_eq!(mesh.shape().float_stride(), 8);
        for (vertex, uv) in mesh.vertices().iter().zip(QUAD_UVS) {
            assert_eq!(vertex.texture_coord, Some(uv));
            assert_eq!(vertex.normal, Some(Vec3::NEG_Z));
        }
    }

    #[test]
    fn line_is_offset_perpendicular() {
        let corners = line_corners(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert_eq!(
            corners,
            [
                Vec3::new(0.0, -0.5, 0.0),
                Vec3::new(0.0, 0.5, 0.0),
                Vec3::new(2.0, 0.5, 0.0),
                Vec3::new(2.0, -0.5, 0.0),
            ]
        );
    }

    #[test]
    fn degenerate_line_collapses() {
        let corners = line_corners(Vec3::ONE, Vec3::ONE, 1.0);
        assert!(corners.iter().all(|c| *c == Vec3::ONE));
    }

    #[test]
    fn wireframe_has_a_line_per_triangle_edge() {
        let target = quad("quad", UNIT_SQUARE);
        let frame = wireframe(&target, 0.02);

        assert_eq!(frame.len(), 6);
        assert_eq!(frame.name(), "quad_wireframe");

        // First face is [0, 1, 2]; its edges run 0->1, 1->2, 2->0
        let edges = [(0, 1), (1, 2), (2, 0)];
        for (mesh, (a, b)) in frame.meshes().iter().zip(edges) {
            let expected = line_corners(UNIT_SQUARE[a], UNIT_SQUARE[b], 0.02);
            let corners: Vec<Vec3> = mesh.vertices().iter().map(|v| v.position).collect();
            assert_eq!(corners, expected.to_vec());
        }
    }

    #[test]
    fn update_line_moves_vertices() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = line("line", Vec3::ZERO, Vec3::X, 0.2);
        mesh.init(&gl, &contract, MeshUsage::Dynamic).unwrap();

        update_line(&mut mesh, &gl, Vec3::ZERO, Vec3::Y, 0.2).unwrap();

        let positions: Vec<Vec3> = mesh.vertices().iter().map(|v| v.position).collect();
        assert_eq!(positions, line_corners(Vec3::ZERO, Vec3::Y, 0.2).to_vec());
    }
}
