use glam::{Mat4, Vec3};

/// Position, Euler rotation (degrees) and scale of a mesh
#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,

    // Cached matrix, recomputed on demand
    cached_matrix: Mat4,
    matrix_dirty: bool,
}

impl Transform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            cached_matrix: Mat4::IDENTITY,
            matrix_dirty: true,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::ZERO)
    }

    /// Get the model matrix (cached).
    /// Order: translate * rotY * rotZ * rotX * scale
    pub fn matrix(&mut self) -> Mat4 {
        if self.matrix_dirty {
            self.cached_matrix = self.compute_matrix();
            self.matrix_dirty = false;
        }
        self.cached_matrix
    }

    pub fn compute_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_scale(self.scale)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.matrix_dirty = true;
    }

    /// Euler angles in degrees
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.matrix_dirty = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.matrix_dirty = true;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.matrix_dirty = true;
    }

    /// Adds to the current rotation (degrees)
    pub fn rotate(&mut self, degrees: Vec3) {
        self.rotation += degrees;
        self.matrix_dirty = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix() {
        let mut transform = Transform::identity();
        assert_eq!(transform.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_translation() {
        let mut transform = Transform::new(Vec3::new(1.0, 0.0, 0.0));
        transform.set_scale(Vec3::splat(2.0));

        let p = transform.matrix().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 2.0), 1e-6));
    }

    #[test]
    fn rotation_is_in_degrees_and_cache_updates() {
        let mut transform = Transform::identity();
        let before = transform.matrix();

        transform.rotate(Vec3::new(0.0, 90.0, 0.0));
        let p = transform.matrix().transform_point3(Vec3::X);

        assert_ne!(before, transform.matrix());
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }
}
