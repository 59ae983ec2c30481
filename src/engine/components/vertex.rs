use std::hash::{Hash, Hasher};

use glam::{Vec2, Vec3};

/// Index into a mesh's vertex list
pub type VertexIndex = u32;

/// Three vertex indices forming one triangle
pub type Face = [VertexIndex; 3];

/// A mesh vertex. Texture coordinates and normals are optional, but every
/// vertex of one mesh is expected to carry the same set.
///
/// Equality and hashing compare the exact bit patterns of every component, so
/// `0.0` and `-0.0` are distinct and a vertex containing NaN still equals itself.
/// This is what the importer relies on for deduplication.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub texture_coord: Option<Vec2>,
    pub normal: Option<Vec3>,
}

type VertexBits = ([u32; 3], Option<[u32; 2]>, Option<[u32; 3]>);

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            texture_coord: None,
            normal: None,
        }
    }

    pub fn with_texture_coord(mut self, texture_coord: Vec2) -> Self {
        self.texture_coord = Some(texture_coord);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn shape(&self) -> VertexShape {
        VertexShape {
            has_texture_coord: self.texture_coord.is_some(),
            has_normal: self.normal.is_some(),
        }
    }

    fn bits(&self) -> VertexBits {
        (
            self.position.to_array().map(f32::to_bits),
            self.texture_coord.map(|t| t.to_array().map(f32::to_bits)),
            self.normal.map(|n| n.to_array().map(f32::to_bits)),
        )
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// Which optional attributes a mesh's vertices carry.
///
/// Interleaved layout is always position, then texture coordinate, then normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexShape {
    pub has_texture_coord: bool,
    pub has_normal: bool,
}

impl VertexShape {
    pub const POSITION_COMPONENTS: usize = 3;
    pub const TEXTURE_COMPONENTS: usize = 2;
    pub const NORMAL_COMPONENTS: usize = 3;

    /// Floats per interleaved vertex
    pub fn float_stride(&self) -> usize {
        let mut stride = Self::POSITION_COMPONENTS;
        if self.has_texture_coord {
            stride += Self::TEXTURE_COMPONENTS;
        }
        if self.has_normal {
            stride += Self::NORMAL_COMPONENTS;
        }
        stride
    }

    pub fn byte_stride(&self) -> usize {
        self.float_stride() * std::mem::size_of::<f32>()
    }

    /// Float offset of the texture coordinate inside a vertex
    pub fn texture_offset(&self) -> Option<usize> {
        self.has_texture_coord.then_some(Self::POSITION_COMPONENTS)
    }

    /// Float offset of the normal inside a vertex
    pub fn normal_offset(&self) -> Option<usize> {
        self.has_normal.then(|| {
            Self::POSITION_COMPONENTS
                + if self.has_texture_coord { Self::TEXTURE_COMPONENTS } else { 0 }
        })
    }

    /// Appends `vertex` to `out` in this shape's layout.
    ///
    /// Attributes the shape has but the vertex lacks are written as zeros;
    /// attributes the vertex has but the shape lacks are dropped.
    pub fn write_vertex(&self, vertex: &Vertex, out: &mut Vec<f32>) {
        out.extend_from_slice(&vertex.position.to_array());
        if self.has_texture_coord {
            out.extend_from_slice(&vertex.texture_coord.unwrap_or(Vec2::ZERO).to_array());
        }
        if self.has_normal {
            out.extend_from_slice(&vertex.normal.unwrap_or(Vec3::ZERO).to_array());
        }
    }

    pub fn interleave(&self, vertices: &[Vertex]) -> Vec<f32> {
        let mut out = Vec::with_capacity(vertices.len() * self.float_stride());
        for vertex in vertices {
            self.write_vertex(vertex, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn stride_follows_present_attributes() {
        let bare = Vertex::new(Vec3::ONE).shape();
        let textured = Vertex::new(Vec3::ONE).with_texture_coord(Vec2::ZERO).shape();
        let full = Vertex::new(Vec3::ONE)
            .with_texture_coord(Vec2::ZERO)
            .with_normal(Vec3::Z)
            .shape();

        assert_eq!(bare.float_stride(), 3);
        assert_eq!(textured.float_stride(), 5);
        assert_eq!(full.float_stride(), 8);
        assert_eq!(full.byte_stride(), 32);
        assert_eq!(full.texture_offset(), Some(3));
        assert_eq!(full.normal_offset(), Some(5));
        assert_eq!(Vertex::new(Vec3::ONE).with_normal(Vec3::Z).shape().normal_offset(), Some(3));
    }

    #[test]
    fn equality_is_bitwise() {
        let a = Vertex::new(Vec3::new(0.0, 1.0, 2.0));
        let b = Vertex::new(Vec3::new(-0.0, 1.0, 2.0));
        let nan = Vertex::new(Vec3::new(f32::NAN, 0.0, 0.0));

        assert_ne!(a, b);
        assert_eq!(nan, nan);

        let set: HashSet<Vertex> = [a, a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn missing_attribute_is_zero_filled() {
        let shape = VertexShape {
            has_texture_coord: true,
            has_normal: true,
        };
        let data = shape.interleave(&[Vertex::new(Vec3::new(1.0, 2.0, 3.0)).with_normal(Vec3::Y)]);
        assert_eq!(data, vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }
}
